//! Configuration validation
//!
//! Validates configuration values at startup to catch misconfigurations early.

use anyhow::{Context, Result};
use videostore_core::Config;

/// Validate configuration values, failing fast on anything that would break at runtime.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if !config.is_production() && config.cors_origins.iter().any(|o| o == "*") {
        tracing::debug!("CORS allows all origins (development mode)");
    }

    Ok(())
}

/// Make sure the static directory exists. A missing `index.html` only disables `GET /`.
pub async fn check_static_dir(config: &Config) -> Result<()> {
    let static_dir = &config.static_dir;
    tokio::fs::create_dir_all(static_dir)
        .await
        .with_context(|| format!("Failed to create static directory {}", static_dir.display()))?;

    let index = static_dir.join("index.html");
    if !tokio::fs::try_exists(&index).await.unwrap_or(false) {
        tracing::warn!(
            path = %index.display(),
            "index.html not found; GET / will return 404"
        );
    }

    Ok(())
}
