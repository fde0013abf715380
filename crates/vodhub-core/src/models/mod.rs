//! Data models for the application
//!
//! `video` holds the identifier and metadata record types, `artifact` the rules for
//! transcoder output file names and the content types they are served with.

mod artifact;
mod video;

pub use artifact::{ArtifactKind, ArtifactName, MANIFEST_FILENAME};
pub use video::{IdentifierError, VideoId, VideoRecord, VideoResponse};
