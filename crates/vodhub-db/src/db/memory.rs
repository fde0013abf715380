//! In-memory metadata index for tests and local development

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use vodhub_core::{VideoId, VideoRecord};

use super::video::{IndexError, IndexResult, MetadataIndex};

#[derive(Clone, Default)]
pub struct MemoryMetadataIndex {
    records: Arc<RwLock<HashMap<VideoId, VideoRecord>>>,
}

impl MemoryMetadataIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataIndex for MemoryMetadataIndex {
    async fn create(&self, id: &VideoId, uploaded_at: DateTime<Utc>) -> IndexResult<VideoRecord> {
        let mut records = self.records.write().await;
        if records.contains_key(id) {
            return Err(IndexError::Conflict(id.to_string()));
        }
        let record = VideoRecord::new(id.clone(), uploaded_at);
        records.insert(id.clone(), record.clone());
        Ok(record)
    }

    async fn read(&self, id: &VideoId) -> IndexResult<VideoRecord> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| IndexError::NotFound(id.to_string()))
    }

    async fn list(&self) -> IndexResult<Vec<VideoRecord>> {
        let mut records: Vec<VideoRecord> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| (a.uploaded_at, &a.id).cmp(&(b.uploaded_at, &b.id)));
        Ok(records)
    }

    async fn health_check(&self) -> IndexResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_index_conflict() {
        let index = MemoryMetadataIndex::new();
        let id = VideoId::parse("movie").unwrap();

        index.create(&id, Utc::now()).await.unwrap();
        assert!(matches!(
            index.create(&id, Utc::now()).await,
            Err(IndexError::Conflict(_))
        ));
        assert_eq!(index.list().await.unwrap().len(), 1);
    }
}
