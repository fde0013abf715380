use crate::keys;
use crate::traits::{ByteStream, ContentStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use vodhub_core::{ArtifactName, VideoId};

static PARTIAL_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Local filesystem content store
///
/// Artifacts are written to a partial file next to their final location, synced, and
/// then published with a hard link. `link(2)` refuses to replace an existing entry,
/// so the create-if-absent check and the publish are one atomic step.
#[derive(Clone)]
pub struct LocalContentStore {
    base_path: PathBuf,
}

impl LocalContentStore {
    /// Create a new LocalContentStore instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for content (e.g., "/var/lib/vodhub/content")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalContentStore { base_path })
    }

    /// Convert storage key to filesystem path with security validation
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }
        if storage_key.split('/').any(|part| part.is_empty() || part.starts_with('.')) {
            return Err(StorageError::InvalidKey(format!(
                "Storage key has an empty or hidden component: {}",
                storage_key
            )));
        }

        Ok(self.base_path.join(storage_key))
    }

    fn partial_path(dir: &Path, filename: &ArtifactName) -> PathBuf {
        let n = PARTIAL_COUNTER.fetch_add(1, Ordering::Relaxed);
        dir.join(format!(".{}.{}-{}.partial", filename, std::process::id(), n))
    }

    async fn write_partial(path: &Path, data: &[u8]) -> std::io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for LocalContentStore {
    async fn write(
        &self,
        video_id: &VideoId,
        filename: &ArtifactName,
        data: Bytes,
    ) -> StorageResult<()> {
        let key = keys::content_key(video_id, filename);
        let path = self.key_to_path(&key)?;
        let dir = self.key_to_path(&keys::namespace_key(video_id))?;
        let size = data.len();
        let start = std::time::Instant::now();

        fs::create_dir_all(&dir).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to create namespace {}: {}",
                dir.display(),
                e
            ))
        })?;

        if fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::AlreadyExists(key));
        }

        let partial = Self::partial_path(&dir, filename);
        if let Err(e) = Self::write_partial(&partial, &data).await {
            let _ = fs::remove_file(&partial).await;
            return Err(StorageError::WriteFailed(format!(
                "Failed to write file {}: {}",
                partial.display(),
                e
            )));
        }

        let linked = fs::hard_link(&partial, &path).await;

        if let Err(e) = fs::remove_file(&partial).await {
            tracing::warn!(
                path = %partial.display(),
                error = %e,
                "Failed to remove partial file"
            );
        }

        match linked {
            Ok(()) => {
                tracing::info!(
                    path = %path.display(),
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local content store write successful"
                );
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(StorageError::AlreadyExists(key)),
            Err(e) => Err(StorageError::WriteFailed(format!(
                "Failed to publish file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn read(&self, video_id: &VideoId, filename: &ArtifactName) -> StorageResult<Bytes> {
        let key = keys::content_key(video_id, filename);
        let path = self.key_to_path(&key)?;

        match fs::read(&path).await {
            Ok(data) => {
                tracing::debug!(key = %key, size_bytes = data.len(), "Local content store read");
                Ok(Bytes::from(data))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(key)),
            Err(e) => Err(StorageError::ReadFailed(format!(
                "Failed to read file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn read_stream(
        &self,
        video_id: &VideoId,
        filename: &ArtifactName,
    ) -> StorageResult<ByteStream> {
        let key = keys::content_key(video_id, filename);
        let path = self.key_to_path(&key)?;

        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StorageError::NotFound(key)),
            Err(e) => {
                return Err(StorageError::ReadFailed(format!(
                    "Failed to open file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let path_display = path.display().to_string();
        let stream = tokio_util::io::ReaderStream::new(file).map(move |result| {
            result.map_err(|e| {
                tracing::error!(
                    path = %path_display,
                    key = %key,
                    error = %e,
                    "Local content store stream read error"
                );
                StorageError::ReadFailed(format!("Failed to read chunk: {}", e))
            })
        });

        Ok(Box::pin(stream))
    }

    async fn exists(&self, video_id: &VideoId, filename: &ArtifactName) -> StorageResult<bool> {
        let path = self.key_to_path(&keys::content_key(video_id, filename))?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn list(&self, video_id: &VideoId) -> StorageResult<Vec<String>> {
        let dir = self.key_to_path(&keys::namespace_key(video_id))?;

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            // Partial files are hidden and never valid artifact names.
            if let Some(name) = entry.file_name().to_str() {
                if ArtifactName::parse(name).is_ok() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
