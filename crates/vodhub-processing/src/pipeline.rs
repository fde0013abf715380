//! Ingestion pipeline: validate → stage → transcode → publish → register.
//!
//! ```text
//! Received → Staged → Transcoded → Published → Done
//!     └─────────┴──────────┴────────────→ Failed
//! ```
//!
//! The metadata record is created last, so a listed video always has every artifact
//! its manifest references. The existence check before staging is only a fast path;
//! the index's atomic `create` decides races between attempts with the same id. A
//! lost race leaves published content without a record. That content is unreachable
//! and is not reconciled here.

use bytes::Bytes;
use chrono::Utc;
use futures::TryStreamExt;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use vodhub_core::{AppError, ArtifactName, VideoId, VideoRecord, MANIFEST_FILENAME};
use vodhub_db::{IndexError, MetadataIndex};
use vodhub_storage::{ContentStore, StorageError};

use crate::staging::{StagedArtifact, StagingArea, StagingDir};
use crate::transcoder::Transcoder;
use crate::validator::UploadValidator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    Received,
    Staged,
    Transcoded,
    Published,
    Done,
    Failed,
}

impl Display for IngestState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            IngestState::Received => "received",
            IngestState::Staged => "staged",
            IngestState::Transcoded => "transcoded",
            IngestState::Published => "published",
            IngestState::Done => "done",
            IngestState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub record: VideoRecord,
    /// Artifacts written by this attempt, in publish order.
    pub published: Vec<String>,
    /// Artifacts another attempt had already written.
    pub already_present: Vec<String>,
}

pub struct IngestionPipeline {
    index: Arc<dyn MetadataIndex>,
    store: Arc<dyn ContentStore>,
    transcoder: Arc<dyn Transcoder>,
    staging: StagingArea,
    validator: UploadValidator,
}

impl IngestionPipeline {
    pub fn new(
        index: Arc<dyn MetadataIndex>,
        store: Arc<dyn ContentStore>,
        transcoder: Arc<dyn Transcoder>,
        staging: StagingArea,
        validator: UploadValidator,
    ) -> Self {
        Self {
            index,
            store,
            transcoder,
            staging,
            validator,
        }
    }

    pub fn validator(&self) -> &UploadValidator {
        &self.validator
    }

    /// Ingest one uploaded file.
    ///
    /// The staging directory is removed before this returns, whatever the outcome. A
    /// failure to remove it is logged and never replaces the attempt's own result.
    #[tracing::instrument(skip(self, data), fields(size_bytes = data.len()))]
    pub async fn ingest(&self, filename: &str, data: Bytes) -> Result<IngestReport, AppError> {
        let video_id = VideoId::from_filename(filename)?;
        tracing::info!(video_id = %video_id, state = %IngestState::Received, "Upload received");

        let extension = self.validator.validate_all(filename, data.len())?;

        match self.index.read(&video_id).await {
            Ok(_) => {
                tracing::info!(video_id = %video_id, "Video already registered, skipping");
                return Err(IndexError::Conflict(video_id.to_string()).into());
            }
            Err(IndexError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let mut staging = self.staging.create().await.map_err(|e| {
            AppError::InternalWithSource {
                message: "Failed to allocate staging directory".to_string(),
                source: e.into(),
            }
        })?;

        let result = self
            .run_staged(&video_id, &extension, data, &mut staging)
            .await;

        if let Err(e) = staging.destroy().await {
            tracing::warn!(video_id = %video_id, error = %e, "Failed to remove staging directory");
        }

        match &result {
            Ok(report) => tracing::info!(
                video_id = %video_id,
                state = %IngestState::Done,
                published = report.published.len(),
                already_present = report.already_present.len(),
                "Ingestion complete"
            ),
            Err(e) => tracing::warn!(
                video_id = %video_id,
                state = %IngestState::Failed,
                error = %e,
                "Ingestion failed"
            ),
        }

        result
    }

    async fn run_staged(
        &self,
        video_id: &VideoId,
        extension: &str,
        data: Bytes,
        staging: &mut StagingDir,
    ) -> Result<IngestReport, AppError> {
        let input = staging.put_input(extension, &data).await.map_err(|e| {
            AppError::InternalWithSource {
                message: "Failed to stage upload".to_string(),
                source: e.into(),
            }
        })?;
        drop(data);
        tracing::info!(video_id = %video_id, state = %IngestState::Staged, "Upload staged");

        let manifest = staging.manifest_path();
        self.transcoder
            .transcode(&input, &manifest)
            .await
            .map_err(|e| AppError::TranscodeFailed(e.to_string()))?;

        if !tokio::fs::try_exists(&manifest).await.unwrap_or(false) {
            return Err(AppError::TranscodeFailed(format!(
                "transcoder exited successfully but wrote no {}",
                MANIFEST_FILENAME
            )));
        }
        tracing::info!(video_id = %video_id, state = %IngestState::Transcoded, "Transcode finished");

        let (published, already_present) = self.publish(video_id, staging).await?;
        tracing::info!(
            video_id = %video_id,
            state = %IngestState::Published,
            artifacts = published.len() + already_present.len(),
            "Artifacts published"
        );

        let record = self.index.create(video_id, Utc::now()).await?;

        Ok(IngestReport {
            record,
            published,
            already_present,
        })
    }

    /// Write every produced artifact to the store, manifest last.
    async fn publish(
        &self,
        video_id: &VideoId,
        staging: &StagingDir,
    ) -> Result<(Vec<String>, Vec<String>), AppError> {
        let mut artifacts: Vec<StagedArtifact> = staging
            .outputs()
            .try_collect()
            .await
            .map_err(|e| AppError::PublishFailed(format!("Failed to list transcoder output: {}", e)))?;
        artifacts.sort_by(|a, b| {
            (a.file_name == MANIFEST_FILENAME, &a.file_name)
                .cmp(&(b.file_name == MANIFEST_FILENAME, &b.file_name))
        });

        let mut published = Vec::new();
        let mut already_present = Vec::new();

        for artifact in artifacts {
            let name = match ArtifactName::parse(&artifact.file_name) {
                Ok(name) => name,
                Err(e) => {
                    tracing::warn!(
                        video_id = %video_id,
                        file = %artifact.file_name,
                        error = %e,
                        "Skipping transcoder output with an unusable name"
                    );
                    continue;
                }
            };

            let bytes = tokio::fs::read(&artifact.path).await.map_err(|e| {
                AppError::PublishFailed(format!("Failed to read {}: {}", artifact.file_name, e))
            })?;

            match self.store.write(video_id, &name, Bytes::from(bytes)).await {
                Ok(()) => published.push(artifact.file_name),
                Err(StorageError::AlreadyExists(_)) => {
                    tracing::debug!(video_id = %video_id, file = %name, "Artifact already published");
                    already_present.push(artifact.file_name);
                }
                Err(e) => {
                    tracing::error!(
                        video_id = %video_id,
                        file = %name,
                        error = %e,
                        published = published.len(),
                        "Publish aborted; earlier artifacts remain in the store"
                    );
                    return Err(AppError::PublishFailed(format!(
                        "Failed to write {}: {}",
                        name, e
                    )));
                }
            }
        }

        Ok((published, already_present))
    }
}
