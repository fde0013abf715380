//! Test helpers: build the real router around an in-memory index, a temp-dir content
//! store and a transcoder that writes a fixed DASH output set.
//!
//! Run from workspace root: `cargo test -p vodhub-api`.

use async_trait::async_trait;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use vodhub_api::setup::{database, routes, services, storage};
use vodhub_core::{Config, StorageBackend, TranscodeSettings};
use vodhub_processing::{TranscodeError, Transcoder};

pub const MANIFEST: &[u8] = b"<MPD><SegmentTemplate initialization=\"init-$RepresentationID$.m4s\"/></MPD>";
pub const INIT_SEGMENT: &[u8] = b"init-segment";
pub const MEDIA_SEGMENT: &[u8] = b"media-segment";

/// Stands in for ffmpeg.
pub struct FakeTranscoder {
    pub fail: bool,
    pub delay: Duration,
}

impl FakeTranscoder {
    pub fn succeeding() -> Self {
        Self {
            fail: false,
            delay: Duration::ZERO,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            delay: Duration::ZERO,
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self { fail: false, delay }
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn transcode(&self, input: &Path, manifest: &Path) -> Result<(), TranscodeError> {
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(TranscodeError::Failed {
                status: "exit status: 1".to_string(),
                stderr: format!("{}: Invalid data found when processing input", input.display()),
            });
        }
        let dir = manifest.parent().expect("manifest has a parent directory");
        tokio::fs::write(dir.join("init-0.m4s"), INIT_SEGMENT).await.unwrap();
        tokio::fs::write(dir.join("chunk-0-00001.m4s"), MEDIA_SEGMENT)
            .await
            .unwrap();
        tokio::fs::write(manifest, MANIFEST).await.unwrap();
        Ok(())
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub content_dir: TempDir,
    pub staging_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn staging_entries(&self) -> usize {
        std::fs::read_dir(self.staging_dir.path()).unwrap().count()
    }

    pub fn published_files(&self, video_id: &str) -> Vec<String> {
        let dir = self.content_dir.path().join("videos").join(video_id);
        let mut names: Vec<String> = match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}

pub fn create_test_config(content_root: PathBuf, staging_dir: PathBuf) -> Config {
    Config {
        server_port: 4000,
        environment: "test".to_string(),
        cors_origins: vec!["*".to_string()],
        database_url: "sqlite::memory:".to_string(),
        db_max_connections: 1,
        db_timeout_seconds: 5,
        storage_backend: StorageBackend::Local,
        content_root,
        staging_dir,
        staging_max_age_secs: 86_400,
        max_upload_size_bytes: 1024,
        video_allowed_extensions: vec!["mp4".to_string(), "mov".to_string()],
        ffmpeg_path: "ffmpeg".to_string(),
        transcode: TranscodeSettings::default(),
    }
}

pub async fn setup_test_app(transcoder: FakeTranscoder) -> TestApp {
    let content_dir = tempfile::tempdir().expect("Failed to create content directory");
    let staging_dir = tempfile::tempdir().expect("Failed to create staging directory");
    let config = create_test_config(
        content_dir.path().to_path_buf(),
        staging_dir.path().to_path_buf(),
    );

    let index = Arc::new(
        database::setup_database(&config)
            .await
            .expect("Failed to set up database"),
    );
    let store = storage::setup_storage(&config)
        .await
        .expect("Failed to set up content store");
    let staging = storage::setup_staging(&config)
        .await
        .expect("Failed to set up staging");

    let state =
        services::initialize_services(&config, index, store, Arc::new(transcoder), staging);
    let app = routes::setup_routes(&config, state).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        content_dir,
        staging_dir,
    }
}

pub fn upload_form(filename: &str, data: &[u8]) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(data.to_vec())
            .file_name(filename)
            .mime_type("video/mp4"),
    )
}
