//! Storage setup and initialization

use anyhow::Result;
use std::sync::Arc;
use videostore_core::Config;
use videostore_storage::{create_store, VideoStore};

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn VideoStore>> {
    tracing::info!("Initializing video storage...");
    let store = create_store(config).await?;

    store
        .health_check()
        .await
        .map_err(|e| anyhow::anyhow!("Video storage is not usable: {}", e))?;

    tracing::info!(
        backend = %store.backend_type(),
        video_dir = %config.video_dir.display(),
        "Video storage initialized successfully"
    );

    Ok(store)
}
