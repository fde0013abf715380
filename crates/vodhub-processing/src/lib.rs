//! Vodhub Processing Library
//!
//! The ingestion pipeline and its collaborators: upload validation, per-attempt staging
//! directories, the external transcoder, and the content resolver used to serve
//! published artifacts.

pub mod pipeline;
pub mod resolver;
pub mod staging;
pub mod transcoder;
pub mod validator;

pub use pipeline::{IngestReport, IngestState, IngestionPipeline};
pub use resolver::{ContentResolver, ContentStream, ResolvedContent};
pub use staging::{StagedArtifact, StagingArea, StagingDir};
pub use transcoder::{FfmpegTranscoder, TranscodeError, TranscodeProfile, Transcoder};
pub use validator::{UploadValidator, ValidationError};
