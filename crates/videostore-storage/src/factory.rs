#[cfg(feature = "storage-local")]
use crate::LocalVideoStore;
#[cfg(feature = "storage-memory")]
use crate::MemoryVideoStore;
use crate::{StorageBackend, StorageResult, VideoStore};
use std::sync::Arc;
use videostore_core::Config;

/// Create a storage backend based on configuration
pub async fn create_store(config: &Config) -> StorageResult<Arc<dyn VideoStore>> {
    match config.storage_backend {
        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let store = LocalVideoStore::new(config.video_dir.clone()).await?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(crate::StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-memory")]
        StorageBackend::Memory => Ok(Arc::new(MemoryVideoStore::new())),

        #[cfg(not(feature = "storage-memory"))]
        StorageBackend::Memory => Err(crate::StorageError::ConfigError(
            "Memory storage backend not available (storage-memory feature not enabled)"
                .to_string(),
        )),
    }
}
