#[cfg(feature = "storage-local")]
use crate::LocalContentStore;
#[cfg(feature = "storage-memory")]
use crate::MemoryContentStore;
use crate::{ContentStore, StorageBackend, StorageResult};
#[cfg(not(all(feature = "storage-local", feature = "storage-memory")))]
use crate::StorageError;
use std::sync::Arc;
use vodhub_core::Config;

/// Create a content store based on configuration
pub async fn create_content_store(config: &Config) -> StorageResult<Arc<dyn ContentStore>> {
    match config.storage_backend {
        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let store = LocalContentStore::new(config.content_root.clone()).await?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-memory")]
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory content store; published videos are lost on restart");
            Ok(Arc::new(MemoryContentStore::new()))
        }

        #[cfg(not(feature = "storage-memory"))]
        StorageBackend::Memory => Err(StorageError::ConfigError(
            "Memory storage backend not available (storage-memory feature not enabled)"
                .to_string(),
        )),
    }
}
