//! Wiring of the pipeline, resolver and index into `AppState`.

use crate::state::AppState;
use std::sync::Arc;
use vodhub_core::Config;
use vodhub_db::MetadataIndex;
use vodhub_processing::{
    ContentResolver, FfmpegTranscoder, IngestionPipeline, StagingArea, TranscodeProfile,
    Transcoder, UploadValidator,
};
use vodhub_storage::ContentStore;

/// ffmpeg transcoder built from configuration. A missing binary is reported but does not
/// stop startup; uploads fail with a transcode error until it is installed.
pub async fn setup_transcoder(config: &Config) -> Arc<dyn Transcoder> {
    let transcoder = FfmpegTranscoder::new(
        config.ffmpeg_path.clone(),
        TranscodeProfile::from(&config.transcode),
    );

    match transcoder.verify().await {
        Ok(version) => tracing::info!(ffmpeg_path = %config.ffmpeg_path, version = %version, "ffmpeg available"),
        Err(e) => tracing::warn!(
            ffmpeg_path = %config.ffmpeg_path,
            error = %e,
            "ffmpeg not usable - uploads will fail until it is installed"
        ),
    }

    Arc::new(transcoder)
}

pub fn initialize_services(
    config: &Config,
    index: Arc<dyn MetadataIndex>,
    store: Arc<dyn ContentStore>,
    transcoder: Arc<dyn Transcoder>,
    staging: StagingArea,
) -> Arc<AppState> {
    let validator = UploadValidator::new(
        config.max_upload_size_bytes,
        config.video_allowed_extensions.clone(),
    );

    let pipeline = Arc::new(IngestionPipeline::new(
        index.clone(),
        store.clone(),
        transcoder,
        staging,
        validator,
    ));

    Arc::new(AppState {
        config: config.clone(),
        index,
        pipeline,
        resolver: ContentResolver::new(store),
    })
}
