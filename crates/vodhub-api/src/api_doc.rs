//! OpenAPI documentation, served at `/api/openapi.json` and rendered by RapiDoc at `/docs`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use vodhub_core::models;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vodhub API",
        version = "0.1.0",
        description = "Video ingestion and MPEG-DASH delivery. Uploaded videos are transcoded once, published to write-once content storage and registered in a metadata index."
    ),
    paths(
        handlers::upload::upload_video,
        handlers::videos::list_videos,
        handlers::videos::get_video,
        handlers::content::serve_content,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::VideoResponse,
            error::ErrorResponse,
            handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "videos", description = "Upload and look up videos"),
        (name = "content", description = "DASH manifests and segments"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
