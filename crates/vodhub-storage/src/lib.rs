//! Vodhub Storage Library
//!
//! This crate provides the write-once content store that holds published DASH
//! artifacts. It includes the `ContentStore` trait and implementations for the local
//! filesystem and process memory.
//!
//! # Storage key format
//!
//! Every video owns one namespace: `videos/{video_id}/{filename}`. Both components are
//! validated types (`VideoId`, `ArtifactName`), and key generation is centralized in
//! the `keys` module so all backends stay consistent.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-memory")]
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use factory::create_content_store;
#[cfg(feature = "storage-local")]
pub use local::LocalContentStore;
#[cfg(feature = "storage-memory")]
pub use memory::MemoryContentStore;
pub use traits::{ByteStream, ContentStore, StorageError, StorageResult};
pub use vodhub_core::StorageBackend;
