//! Vodhub Core Library
//!
//! This crate provides the domain models, error types and configuration shared by
//! every Vodhub component: the video identifier rules, the artifact allow-list, and
//! the `AppError` taxonomy the ingestion pipeline reports to its callers.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, TranscodeSettings};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    ArtifactKind, ArtifactName, IdentifierError, VideoId, VideoRecord, VideoResponse,
    MANIFEST_FILENAME,
};
pub use storage_types::StorageBackend;
