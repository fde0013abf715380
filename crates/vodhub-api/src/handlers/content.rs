use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use futures::StreamExt;
use std::sync::Arc;
use vodhub_core::AppError;

/// Published artifacts never change once written.
const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

#[utoipa::path(
    get,
    path = "/content/{video_id}/{filename}",
    tag = "content",
    params(
        ("video_id" = String, Path, description = "Video ID"),
        ("filename" = String, Path, description = "Manifest or segment file name")
    ),
    responses(
        (status = 200, description = "Artifact bytes: application/dash+xml for manifests, video/iso.segment for segments"),
        (status = 400, description = "Malformed video ID or file name", body = ErrorResponse),
        (status = 404, description = "Artifact not found", body = ErrorResponse),
        (status = 415, description = "Not a servable artifact type", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "serve_content"))]
pub async fn serve_content(
    Path((video_id, filename)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, HttpAppError> {
    let content = state.resolver.open(&video_id, &filename).await?;

    let body_stream = content.body.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content.content_type)
        .header(header::CACHE_CONTROL, IMMUTABLE_CACHE_CONTROL)
        .body(Body::from_stream(body_stream))
        .map_err(|e| AppError::Internal(format!("Failed to build content response: {}", e)))?;

    Ok(response)
}
