//! Vodhub metadata index
//!
//! The index is the single source of truth for which videos exist. `create` is an
//! atomic insert-if-absent backed by the `videos.id` primary key, so two concurrent
//! ingestions of the same id cannot both register a record.

pub mod db;

pub use db::{
    connect, IndexError, IndexResult, MemoryMetadataIndex, MetadataIndex, VideoRepository,
    MIGRATOR,
};
