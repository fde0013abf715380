use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Sqlite, SqlitePool};
use vodhub_core::{AppError, VideoId, VideoRecord};

/// Metadata index errors
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Video '{0}' already exists")]
    Conflict(String),

    #[error("Video '{0}' not found")]
    NotFound(String),

    #[error("Metadata index unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for IndexError {
    fn from(err: sqlx::Error) -> Self {
        IndexError::Unavailable(err.to_string())
    }
}

impl From<IndexError> for AppError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Conflict(id) => AppError::Conflict(format!("Video '{}' already exists", id)),
            IndexError::NotFound(id) => AppError::NotFound(format!("Video '{}' not found", id)),
            IndexError::Unavailable(msg) => AppError::StorageUnavailable(msg),
        }
    }
}

pub type IndexResult<T> = Result<T, IndexError>;

/// Registry of published videos
///
/// Implementations must make `create` an atomic insert-if-absent: when two callers
/// race on the same id, exactly one succeeds and the other gets `Conflict`.
#[async_trait]
pub trait MetadataIndex: Send + Sync {
    async fn create(&self, id: &VideoId, uploaded_at: DateTime<Utc>) -> IndexResult<VideoRecord>;

    async fn read(&self, id: &VideoId) -> IndexResult<VideoRecord>;

    /// All records ordered by `(uploaded_at, id)`.
    async fn list(&self) -> IndexResult<Vec<VideoRecord>>;

    async fn health_check(&self) -> IndexResult<()>;
}

#[derive(sqlx::FromRow)]
struct VideoRow {
    id: String,
    uploaded_at: String,
}

impl TryFrom<VideoRow> for VideoRecord {
    type Error = IndexError;

    fn try_from(row: VideoRow) -> Result<Self, Self::Error> {
        let id = VideoId::parse(&row.id).map_err(|e| {
            IndexError::Unavailable(format!("stored id {:?} is invalid: {}", row.id, e))
        })?;
        let uploaded_at = DateTime::parse_from_rfc3339(&row.uploaded_at)
            .map_err(|e| {
                IndexError::Unavailable(format!(
                    "stored timestamp {:?} for {} is invalid: {}",
                    row.uploaded_at, id, e
                ))
            })?
            .with_timezone(&Utc);
        Ok(VideoRecord { id, uploaded_at })
    }
}

/// Fixed-width UTC timestamps so the TEXT column sorts chronologically.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// SQLite-backed metadata index
#[derive(Clone)]
pub struct VideoRepository {
    pool: SqlitePool,
}

impl VideoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl MetadataIndex for VideoRepository {
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "insert", db.record_id = %id))]
    async fn create(&self, id: &VideoId, uploaded_at: DateTime<Utc>) -> IndexResult<VideoRecord> {
        // Stored at microsecond precision; return exactly what a later read will see.
        let stamp = format_timestamp(&uploaded_at);

        let result = sqlx::query::<Sqlite>("INSERT INTO videos (id, uploaded_at) VALUES (?, ?)")
            .bind(id.as_str())
            .bind(&stamp)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => {
                tracing::info!(video_id = %id, "Video record created");
                VideoRecord::try_from(VideoRow {
                    id: id.to_string(),
                    uploaded_at: stamp,
                })
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(IndexError::Conflict(id.to_string()))
            }
            Err(e) => {
                tracing::error!(video_id = %id, error = %e, "Failed to create video record");
                Err(e.into())
            }
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    async fn read(&self, id: &VideoId) -> IndexResult<VideoRecord> {
        let row = sqlx::query_as::<Sqlite, VideoRow>(
            "SELECT id, uploaded_at FROM videos WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => Err(IndexError::NotFound(id.to_string())),
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    async fn list(&self) -> IndexResult<Vec<VideoRecord>> {
        let rows = sqlx::query_as::<Sqlite, VideoRow>(
            "SELECT id, uploaded_at FROM videos ORDER BY uploaded_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(VideoRecord::try_from).collect()
    }

    async fn health_check(&self) -> IndexResult<()> {
        sqlx::query::<Sqlite>("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
