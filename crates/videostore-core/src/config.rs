//! Configuration module
//!
//! Server, storage and HTTP settings, read from the environment with defaults that
//! reproduce the fixed constants of a bare deployment (`0.0.0.0:8000`, `videos/`,
//! `static/`).

use std::env;
use std::path::PathBuf;

use crate::storage_types::StorageBackend;

// Common constants
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_VIDEO_DIR: &str = "videos";
const DEFAULT_STATIC_DIR: &str = "static";
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub storage_backend: StorageBackend,
    /// Storage root: one directory per video lives under it.
    pub video_dir: PathBuf,
    /// Holds `index.html` and the assets served under `/static`.
    pub static_dir: PathBuf,
    /// Optional cap on request bodies. `None` accepts uploads of any size.
    pub max_upload_bytes: Option<usize>,
    pub http_concurrency_limit: usize,
    pub cors_origins: Vec<String>,
    pub environment: String,
    /// Emit logs as JSON lines (`LOG_FORMAT=json`) instead of human-readable text.
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: DEFAULT_HOST.to_string(),
            server_port: DEFAULT_PORT,
            storage_backend: StorageBackend::Local,
            video_dir: PathBuf::from(DEFAULT_VIDEO_DIR),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            max_upload_bytes: None,
            http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
            log_json: false,
        }
    }
}

impl Config {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Config::default();

        let server_port = match get("SERVER_PORT").or_else(|| get("PORT")) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("SERVER_PORT must be a valid port number: {}", e))?,
            None => defaults.server_port,
        };

        let storage_backend = match get("STORAGE_BACKEND") {
            Some(raw) => raw.parse::<StorageBackend>()?,
            None => defaults.storage_backend,
        };

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(raw) => Some(
                raw.parse::<usize>()
                    .map_err(|e| anyhow::anyhow!("MAX_UPLOAD_BYTES must be a byte count: {}", e))?,
            ),
            None => None,
        };

        let http_concurrency_limit = match get("HTTP_CONCURRENCY_LIMIT") {
            Some(raw) => raw.parse::<usize>().map_err(|e| {
                anyhow::anyhow!("HTTP_CONCURRENCY_LIMIT must be a positive integer: {}", e)
            })?,
            None => defaults.http_concurrency_limit,
        };

        let cors_origins = get("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.cors_origins);

        let config = Config {
            server_host: get("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port,
            storage_backend,
            video_dir: get("VIDEO_DIR").map(PathBuf::from).unwrap_or(defaults.video_dir),
            static_dir: get("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            max_upload_bytes,
            http_concurrency_limit,
            cors_origins,
            environment: get("ENVIRONMENT")
                .or_else(|| get("APP_ENV"))
                .unwrap_or(defaults.environment),
            log_json: get("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.log_json),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server_port == 0 {
            return Err(anyhow::anyhow!("SERVER_PORT cannot be 0"));
        }

        if self.video_dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("VIDEO_DIR cannot be empty"));
        }

        if self.static_dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("STATIC_DIR cannot be empty"));
        }

        if self.http_concurrency_limit == 0 {
            return Err(anyhow::anyhow!("HTTP_CONCURRENCY_LIMIT cannot be 0"));
        }

        if self.max_upload_bytes == Some(0) {
            return Err(anyhow::anyhow!("MAX_UPLOAD_BYTES cannot be 0"));
        }

        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS configured to allow all origins (*) in production. \
                Set specific allowed origins via CORS_ORIGINS."
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_bare_deployment() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.video_dir, PathBuf::from("videos"));
        assert_eq!(config.static_dir, PathBuf::from("static"));
        assert_eq!(config.storage_backend, StorageBackend::Local);
        assert_eq!(config.max_upload_bytes, None);
        assert!(!config.is_production());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("PORT", "9100"),
            ("STORAGE_BACKEND", "memory"),
            ("VIDEO_DIR", "/srv/videos"),
            ("MAX_UPLOAD_BYTES", "1048576"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();
        assert!(config.log_json);
        assert_eq!(config.server_port, 9100);
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.video_dir, PathBuf::from("/srv/videos"));
        assert_eq!(config.max_upload_bytes, Some(1_048_576));
        assert_eq!(config.cors_origins.len(), 2);
    }

    #[test]
    fn server_port_wins_over_port() {
        let config = config_from(&[("SERVER_PORT", "8080"), ("PORT", "9000")]).unwrap();
        assert_eq!(config.server_port, 8080);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(config_from(&[("SERVER_PORT", "not-a-port")]).is_err());
        assert!(config_from(&[("SERVER_PORT", "0")]).is_err());
        assert!(config_from(&[("STORAGE_BACKEND", "s3")]).is_err());
        assert!(config_from(&[("HTTP_CONCURRENCY_LIMIT", "0")]).is_err());
        assert!(config_from(&[("MAX_UPLOAD_BYTES", "0")]).is_err());
    }

    #[test]
    fn wildcard_cors_rejected_in_production() {
        assert!(config_from(&[("ENVIRONMENT", "production")]).is_err());
        let config = config_from(&[
            ("APP_ENV", "prod"),
            ("CORS_ORIGINS", "https://videos.example"),
        ])
        .unwrap();
        assert!(config.is_production());
    }
}
