//! Content store abstraction trait
//!
//! This module defines the ContentStore trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;
use vodhub_core::{AppError, ArtifactName, VideoId};

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Artifact already exists: {0}")]
    AlreadyExists(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Read-side mapping. Writers that need a different meaning (publishing) map explicitly.
impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("Content not found: {}", key)),
            StorageError::AlreadyExists(key) => {
                AppError::Conflict(format!("Content already exists: {}", key))
            }
            StorageError::InvalidKey(msg) => AppError::InvalidIdentifier(msg),
            other => AppError::StorageUnavailable(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked artifact body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Write-once content store
///
/// Artifacts are addressed by `(video_id, filename)` and can be created exactly once.
/// A second write to the same key fails with `AlreadyExists` and leaves the stored
/// bytes untouched, which makes concurrent re-publication of a key safe without
/// any locking in the caller.
///
/// **Key format:** `videos/{video_id}/{filename}`. See the crate root documentation.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Create the artifact if absent; creates the video's namespace on first write.
    async fn write(&self, video_id: &VideoId, filename: &ArtifactName, data: Bytes)
        -> StorageResult<()>;

    /// Read a whole artifact.
    async fn read(&self, video_id: &VideoId, filename: &ArtifactName) -> StorageResult<Bytes>;

    /// Read an artifact as a stream (for large segments)
    ///
    /// The stream yields `Bytes` chunks as they become available.
    async fn read_stream(
        &self,
        video_id: &VideoId,
        filename: &ArtifactName,
    ) -> StorageResult<ByteStream>;

    /// Check if an artifact exists
    async fn exists(&self, video_id: &VideoId, filename: &ArtifactName) -> StorageResult<bool>;

    /// File names stored under a video, sorted. Empty when the namespace does not exist.
    async fn list(&self, video_id: &VideoId) -> StorageResult<Vec<String>>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
