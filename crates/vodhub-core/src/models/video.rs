use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;

use super::artifact::MANIFEST_FILENAME;

const MAX_VIDEO_ID_LEN: usize = 128;

/// Reasons an untrusted identifier or file name is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier is {len} characters long (max: {max})")]
    TooLong { len: usize, max: usize },

    #[error("identifier contains invalid character {0:?}")]
    InvalidCharacter(char),

    #[error("identifier must not start with {0:?}")]
    InvalidLeadingCharacter(char),

    #[error("file name must not contain path separators")]
    PathSeparator,
}

/// Unique video identifier, derived from the stem of the uploaded file name.
///
/// Only `[A-Za-z0-9_-]` is accepted and the first character may not be `-`, so a
/// `VideoId` is always safe to use as a path component, a storage key segment and
/// a URL path segment without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoId(String);

impl VideoId {
    /// Validate an identifier taken from a request path or a database row.
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        if value.is_empty() {
            return Err(IdentifierError::Empty);
        }
        let len = value.chars().count();
        if len > MAX_VIDEO_ID_LEN {
            return Err(IdentifierError::TooLong {
                len,
                max: MAX_VIDEO_ID_LEN,
            });
        }
        if let Some(c) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(IdentifierError::InvalidCharacter(c));
        }
        if value.starts_with('-') {
            return Err(IdentifierError::InvalidLeadingCharacter('-'));
        }
        Ok(VideoId(value.to_string()))
    }

    /// Derive the identifier from an uploaded file name: the text before the first `.`.
    ///
    /// File names carrying directory components are refused rather than stripped.
    pub fn from_filename(filename: &str) -> Result<Self, IdentifierError> {
        if filename.contains(['/', '\\', '\0']) {
            return Err(IdentifierError::PathSeparator);
        }
        let stem = filename.split('.').next().unwrap_or_default();
        Self::parse(stem)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for VideoId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VideoId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        VideoId::parse(&value)
    }
}

impl From<VideoId> for String {
    fn from(id: VideoId) -> Self {
        id.0
    }
}

/// Metadata registered once a video has been fully published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: VideoId,
    pub uploaded_at: DateTime<Utc>,
}

impl VideoRecord {
    pub fn new(id: VideoId, uploaded_at: DateTime<Utc>) -> Self {
        Self { id, uploaded_at }
    }

    /// Path the manifest is served from.
    pub fn manifest_path(&self) -> String {
        format!("/content/{}/{}", self.id, MANIFEST_FILENAME)
    }
}

/// API representation of a published video.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoResponse {
    /// Video identifier (upload file name stem)
    pub id: String,
    pub uploaded_at: DateTime<Utc>,
    /// Relative URL of the DASH manifest
    pub manifest_url: String,
}

impl From<VideoRecord> for VideoResponse {
    fn from(record: VideoRecord) -> Self {
        let manifest_url = record.manifest_path();
        VideoResponse {
            id: record.id.into(),
            uploaded_at: record.uploaded_at,
            manifest_url,
        }
    }
}
