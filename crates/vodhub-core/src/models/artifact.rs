use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use super::video::IdentifierError;

/// File name the transcoder writes the DASH manifest to.
pub const MANIFEST_FILENAME: &str = "manifest.mpd";

const MAX_ARTIFACT_NAME_LEN: usize = 255;

/// Servable artifact types. Anything outside this list is never read from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Manifest,
    MediaSegment,
    Mp4,
    Webm,
}

impl ArtifactKind {
    /// Classify a file name by its extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "mpd" => Some(ArtifactKind::Manifest),
            "m4s" => Some(ArtifactKind::MediaSegment),
            "mp4" => Some(ArtifactKind::Mp4),
            "webm" => Some(ArtifactKind::Webm),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactKind::Manifest => "application/dash+xml",
            ArtifactKind::MediaSegment => "video/iso.segment",
            ArtifactKind::Mp4 => "video/mp4",
            ArtifactKind::Webm => "video/webm",
        }
    }
}

/// Validated artifact file name, safe to join onto a per-video namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactName(String);

impl ArtifactName {
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        if value.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if value.contains(['/', '\\', '\0']) {
            return Err(IdentifierError::PathSeparator);
        }
        let len = value.chars().count();
        if len > MAX_ARTIFACT_NAME_LEN {
            return Err(IdentifierError::TooLong {
                len,
                max: MAX_ARTIFACT_NAME_LEN,
            });
        }
        if let Some(c) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
        {
            return Err(IdentifierError::InvalidCharacter(c));
        }
        if let Some(first @ ('.' | '-')) = value.chars().next() {
            return Err(IdentifierError::InvalidLeadingCharacter(first));
        }
        Ok(ArtifactName(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ArtifactName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ArtifactName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types() {
        let cases = [
            ("manifest.mpd", "application/dash+xml"),
            ("init-0.m4s", "video/iso.segment"),
            ("chunk-0-00001.M4S", "video/iso.segment"),
            ("preview.mp4", "video/mp4"),
            ("preview.WebM", "video/webm"),
        ];
        for (name, expected) in cases {
            let kind = ArtifactKind::from_filename(name).unwrap();
            assert_eq!(kind.content_type(), expected, "{}", name);
        }
    }

    #[test]
    fn test_unknown_extensions_are_not_classified() {
        assert_eq!(ArtifactKind::from_filename("readme.txt"), None);
        assert_eq!(ArtifactKind::from_filename("manifest"), None);
        assert_eq!(ArtifactKind::from_filename("movie.mov"), None);
    }

    #[test]
    fn test_manifest_constant_is_a_manifest() {
        assert_eq!(
            ArtifactKind::from_filename(MANIFEST_FILENAME),
            Some(ArtifactKind::Manifest)
        );
    }

    #[test]
    fn test_artifact_name_validation() {
        assert!(ArtifactName::parse("chunk-0-00001.m4s").is_ok());
        assert_eq!(ArtifactName::parse(""), Err(IdentifierError::Empty));
        assert_eq!(
            ArtifactName::parse("../secret.mpd"),
            Err(IdentifierError::PathSeparator)
        );
        assert_eq!(
            ArtifactName::parse("..mpd"),
            Err(IdentifierError::InvalidLeadingCharacter('.'))
        );
        assert_eq!(
            ArtifactName::parse("a b.m4s"),
            Err(IdentifierError::InvalidCharacter(' '))
        );
    }
}
