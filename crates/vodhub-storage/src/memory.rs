//! In-memory content store for tests and local development

use crate::keys;
use crate::traits::{ByteStream, ContentStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use vodhub_core::{ArtifactName, VideoId};

/// Process-local write-once store. Contents are lost when the process exits.
#[derive(Clone, Default)]
pub struct MemoryContentStore {
    files: Arc<RwLock<BTreeMap<String, Bytes>>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of artifacts held across all videos (for test assertions)
    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn write(
        &self,
        video_id: &VideoId,
        filename: &ArtifactName,
        data: Bytes,
    ) -> StorageResult<()> {
        let key = keys::content_key(video_id, filename);
        let mut files = self.files.write().await;
        if files.contains_key(&key) {
            return Err(StorageError::AlreadyExists(key));
        }
        tracing::debug!(key = %key, size_bytes = data.len(), "Memory content store write");
        files.insert(key, data);
        Ok(())
    }

    async fn read(&self, video_id: &VideoId, filename: &ArtifactName) -> StorageResult<Bytes> {
        let key = keys::content_key(video_id, filename);
        self.files
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or(StorageError::NotFound(key))
    }

    async fn read_stream(
        &self,
        video_id: &VideoId,
        filename: &ArtifactName,
    ) -> StorageResult<ByteStream> {
        let data = self.read(video_id, filename).await?;
        Ok(Box::pin(stream::once(async move { Ok(data) })))
    }

    async fn exists(&self, video_id: &VideoId, filename: &ArtifactName) -> StorageResult<bool> {
        let key = keys::content_key(video_id, filename);
        Ok(self.files.read().await.contains_key(&key))
    }

    async fn list(&self, video_id: &VideoId) -> StorageResult<Vec<String>> {
        let prefix = format!("{}/", keys::namespace_key(video_id));
        let files = self.files.read().await;
        Ok(files
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(key, _)| key[prefix.len()..].to_string())
            .collect())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_is_write_once() {
        let store = MemoryContentStore::new();
        let id = VideoId::parse("movie").unwrap();
        let name = ArtifactName::parse("manifest.mpd").unwrap();

        store.write(&id, &name, Bytes::from_static(b"a")).await.unwrap();
        let second = store.write(&id, &name, Bytes::from_static(b"b")).await;

        assert!(matches!(second, Err(StorageError::AlreadyExists(_))));
        assert_eq!(&store.read(&id, &name).await.unwrap()[..], b"a");
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_namespace() {
        let store = MemoryContentStore::new();
        let movie = VideoId::parse("movie").unwrap();
        let movie2 = VideoId::parse("movie2").unwrap();

        for name in ["manifest.mpd", "init-0.m4s"] {
            let name = ArtifactName::parse(name).unwrap();
            store.write(&movie, &name, Bytes::new()).await.unwrap();
        }
        let other = ArtifactName::parse("manifest.mpd").unwrap();
        store.write(&movie2, &other, Bytes::new()).await.unwrap();

        assert_eq!(
            store.list(&movie).await.unwrap(),
            vec!["init-0.m4s", "manifest.mpd"]
        );
        assert_eq!(store.len().await, 3);
    }
}
