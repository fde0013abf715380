//! Maps `(video_id, filename)` requests onto stored artifacts.
//!
//! The extension allow-list is checked before anything else, so an unservable name
//! never reaches the content store even when a blob exists under that key.

use bytes::Bytes;
use std::sync::Arc;
use vodhub_core::{AppError, ArtifactKind, ArtifactName, VideoId};
use vodhub_storage::{ByteStream, ContentStore};

/// A whole artifact, with the content type it is served as.
#[derive(Debug, Clone)]
pub struct ResolvedContent {
    pub content_type: &'static str,
    pub bytes: Bytes,
}

/// A streamed artifact.
pub struct ContentStream {
    pub content_type: &'static str,
    pub body: ByteStream,
}

#[derive(Clone)]
pub struct ContentResolver {
    store: Arc<dyn ContentStore>,
}

impl ContentResolver {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Check the filename against the allow-list, then parse both path segments.
    fn classify(
        video_id: &str,
        filename: &str,
    ) -> Result<(&'static str, VideoId, ArtifactName), AppError> {
        let kind = ArtifactKind::from_filename(filename).ok_or_else(|| {
            AppError::UnsupportedArtifact(format!("'{}' is not a servable artifact", filename))
        })?;
        let video_id = VideoId::parse(video_id)?;
        let filename = ArtifactName::parse(filename)?;
        Ok((kind.content_type(), video_id, filename))
    }

    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, video_id: &str, filename: &str) -> Result<ResolvedContent, AppError> {
        let (content_type, video_id, filename) = Self::classify(video_id, filename)?;
        let bytes = self.store.read(&video_id, &filename).await?;
        Ok(ResolvedContent {
            content_type,
            bytes,
        })
    }

    /// Streaming variant of [`resolve`](Self::resolve) for HTTP responses.
    #[tracing::instrument(skip(self))]
    pub async fn open(&self, video_id: &str, filename: &str) -> Result<ContentStream, AppError> {
        let (content_type, video_id, filename) = Self::classify(video_id, filename)?;
        let body = self.store.read_stream(&video_id, &filename).await?;
        Ok(ContentStream { content_type, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use vodhub_storage::MemoryContentStore;

    async fn seeded() -> ContentResolver {
        let store = MemoryContentStore::new();
        let id = VideoId::parse("movie").unwrap();
        for (name, data) in [
            ("manifest.mpd", &b"<MPD/>"[..]),
            ("init-0.m4s", &b"init"[..]),
            ("readme.txt", &b"not servable"[..]),
        ] {
            store
                .write(&id, &ArtifactName::parse(name).unwrap(), Bytes::from(data))
                .await
                .unwrap();
        }
        ContentResolver::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_resolves_manifest_with_dash_content_type() {
        let resolver = seeded().await;
        let content = resolver.resolve("movie", "manifest.mpd").await.unwrap();
        assert_eq!(content.content_type, "application/dash+xml");
        assert_eq!(&content.bytes[..], b"<MPD/>");
    }

    #[tokio::test]
    async fn test_unknown_extension_rejected_even_when_stored() {
        let resolver = seeded().await;
        let err = resolver.resolve("movie", "readme.txt").await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedArtifact(_)));
    }

    #[tokio::test]
    async fn test_extension_checked_before_identifier() {
        let resolver = seeded().await;
        let err = resolver.resolve("../etc", "passwd").await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedArtifact(_)));

        let err = resolver.resolve("../etc", "manifest.mpd").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidIdentifier(_)));
    }

    #[tokio::test]
    async fn test_missing_artifact_is_not_found() {
        let resolver = seeded().await;
        let err = resolver.resolve("movie", "chunk-0-00009.m4s").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = resolver.resolve("other", "manifest.mpd").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_open_streams_segment() {
        let resolver = seeded().await;
        let content = resolver.open("movie", "init-0.m4s").await.unwrap();
        assert_eq!(content.content_type, "video/iso.segment");
        let chunks: Vec<Bytes> = content.body.try_collect().await.unwrap();
        assert_eq!(chunks.concat(), b"init");
    }
}
