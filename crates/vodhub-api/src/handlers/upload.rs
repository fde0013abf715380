use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bytes::{Bytes, BytesMut};
use std::sync::Arc;
use vodhub_core::{AppError, VideoResponse};
use vodhub_processing::ValidationError;

/// Multipart field that carries the video.
const FILE_FIELD: &str = "file";

#[utoipa::path(
    post,
    path = "/upload",
    tag = "videos",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Video ingested and registered", body = VideoResponse),
        (status = 400, description = "Invalid file name or request", body = ErrorResponse),
        (status = 409, description = "A video with this id already exists", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 422, description = "Transcoding failed", body = ErrorResponse),
        (status = 500, description = "Publishing failed", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_video"))]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let max_size = state.pipeline.validator().max_file_size();
    let (filename, data) = read_file_field(&mut multipart, max_size).await?;

    // Detached from the request so a client disconnect cannot abort a transcode halfway.
    let pipeline = state.pipeline.clone();
    let report = tokio::spawn(async move { pipeline.ingest(&filename, data).await })
        .await
        .map_err(|e| AppError::Internal(format!("Ingestion task failed: {}", e)))??;

    Ok((StatusCode::CREATED, Json(VideoResponse::from(report.record))))
}

/// Read the `file` field into memory, refusing to buffer more than `max_size` bytes.
async fn read_file_field(
    multipart: &mut Multipart,
    max_size: usize,
) -> Result<(String, Bytes), HttpAppError> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::InvalidInput("Upload has no file name".to_string()))?;

        let mut data = BytesMut::new();
        while let Some(chunk) = field.chunk().await? {
            if data.len() + chunk.len() > max_size {
                return Err(ValidationError::FileTooLarge {
                    size: data.len() + chunk.len(),
                    max: max_size,
                }
                .into());
            }
            data.extend_from_slice(&chunk);
        }

        return Ok((filename, data.freeze()));
    }

    Err(AppError::InvalidInput(format!("Missing '{}' field in multipart body", FILE_FIELD)).into())
}
