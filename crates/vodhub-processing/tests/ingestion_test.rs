//! End-to-end ingestion against the SQLite index and the filesystem content store.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use vodhub_core::{AppError, ArtifactName, VideoId};
use vodhub_db::{connect, MetadataIndex, VideoRepository, MIGRATOR};
use vodhub_processing::{
    ContentResolver, IngestionPipeline, StagingArea, TranscodeError, Transcoder, UploadValidator,
};
use vodhub_storage::{ContentStore, LocalContentStore};

const MANIFEST: &[u8] = b"<MPD><SegmentTemplate initialization=\"init-0.m4s\"/></MPD>";

/// Stands in for ffmpeg: writes the DASH output set, optionally after a delay.
struct DashFixture {
    delay: Duration,
    fail: bool,
}

#[async_trait]
impl Transcoder for DashFixture {
    async fn transcode(&self, input: &Path, manifest: &Path) -> Result<(), TranscodeError> {
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(TranscodeError::Failed {
                status: "exit status: 1".to_string(),
                stderr: format!("{}: Invalid data found", input.display()),
            });
        }
        let dir = manifest.parent().expect("manifest has a parent");
        tokio::fs::write(dir.join("init-0.m4s"), b"init-bytes").await.unwrap();
        tokio::fs::write(dir.join("chunk-0-00001.m4s"), b"chunk-bytes").await.unwrap();
        tokio::fs::write(manifest, MANIFEST).await.unwrap();
        Ok(())
    }
}

struct TestEnv {
    pipeline: Arc<IngestionPipeline>,
    index: Arc<VideoRepository>,
    store: Arc<LocalContentStore>,
    staging: TempDir,
    _content: TempDir,
    _db: TempDir,
}

async fn setup(transcoder: DashFixture) -> TestEnv {
    let db = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", db.path().join("vodhub.db").display());
    let pool = connect(&url, 4, Duration::from_secs(5)).await.unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    let index = Arc::new(VideoRepository::new(pool));

    let content = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalContentStore::new(content.path()).await.unwrap());

    let staging = tempfile::tempdir().unwrap();
    let pipeline = Arc::new(IngestionPipeline::new(
        index.clone(),
        store.clone(),
        Arc::new(transcoder),
        StagingArea::new(staging.path()),
        UploadValidator::new(10 * 1024 * 1024, vec!["mp4".to_string()]),
    ));

    TestEnv {
        pipeline,
        index,
        store,
        staging,
        _content: content,
        _db: db,
    }
}

fn staging_entries(env: &TestEnv) -> usize {
    std::fs::read_dir(env.staging.path()).unwrap().count()
}

fn movie() -> VideoId {
    VideoId::parse("movie").unwrap()
}

#[tokio::test]
async fn test_upload_is_transcoded_published_and_registered() {
    let env = setup(DashFixture {
        delay: Duration::ZERO,
        fail: false,
    })
    .await;

    let report = env
        .pipeline
        .ingest("movie.mp4", Bytes::from_static(b"raw video bytes"))
        .await
        .unwrap();

    let record = env.index.read(&movie()).await.unwrap();
    assert_eq!(record, report.record);

    let resolver = ContentResolver::new(env.store.clone());
    let manifest = resolver.resolve("movie", "manifest.mpd").await.unwrap();
    assert_eq!(manifest.content_type, "application/dash+xml");
    assert_eq!(&manifest.bytes[..], MANIFEST);
    for name in ["init-0.m4s", "chunk-0-00001.m4s"] {
        let segment = resolver.resolve("movie", name).await.unwrap();
        assert_eq!(segment.content_type, "video/iso.segment");
    }

    // The raw input is never published.
    assert_eq!(
        env.store.list(&movie()).await.unwrap(),
        vec!["chunk-0-00001.m4s", "init-0.m4s", "manifest.mpd"]
    );
    assert_eq!(staging_entries(&env), 0);
}

#[tokio::test]
async fn test_repeat_upload_conflicts_and_changes_nothing() {
    let env = setup(DashFixture {
        delay: Duration::ZERO,
        fail: false,
    })
    .await;

    env.pipeline
        .ingest("movie.mp4", Bytes::from_static(b"first"))
        .await
        .unwrap();
    let before = env.store.list(&movie()).await.unwrap();
    let manifest_name = ArtifactName::parse("manifest.mpd").unwrap();
    let manifest_before = env.store.read(&movie(), &manifest_name).await.unwrap();

    let err = env
        .pipeline
        .ingest("movie.mp4", Bytes::from_static(b"second"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(env.index.list().await.unwrap().len(), 1);
    assert_eq!(env.store.list(&movie()).await.unwrap(), before);
    assert_eq!(
        env.store.read(&movie(), &manifest_name).await.unwrap(),
        manifest_before
    );
}

#[tokio::test]
async fn test_transcoder_failure_registers_nothing_and_cleans_staging() {
    let env = setup(DashFixture {
        delay: Duration::ZERO,
        fail: true,
    })
    .await;

    let err = env
        .pipeline
        .ingest("movie.mp4", Bytes::from_static(b"garbage"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::TranscodeFailed(_)));
    assert!(matches!(
        env.index.read(&movie()).await,
        Err(vodhub_db::IndexError::NotFound(_))
    ));
    assert!(env.store.list(&movie()).await.unwrap().is_empty());
    assert_eq!(staging_entries(&env), 0);
}

#[tokio::test]
async fn test_concurrent_uploads_with_same_id_single_winner() {
    // The delay lets both attempts pass the advisory existence check.
    let env = setup(DashFixture {
        delay: Duration::from_millis(100),
        fail: false,
    })
    .await;

    let a = {
        let pipeline = env.pipeline.clone();
        tokio::spawn(async move { pipeline.ingest("movie.mp4", Bytes::from_static(b"a")).await })
    };
    let b = {
        let pipeline = env.pipeline.clone();
        tokio::spawn(async move { pipeline.ingest("movie.mp4", Bytes::from_static(b"b")).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let done = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::Conflict(_))))
        .count();

    assert_eq!(done, 1);
    assert_eq!(conflicts, 1);
    assert_eq!(env.index.list().await.unwrap().len(), 1);
    assert_eq!(env.store.list(&movie()).await.unwrap().len(), 3);
    assert_eq!(staging_entries(&env), 0);
}

#[tokio::test]
async fn test_distinct_ids_ingest_in_parallel() {
    let env = setup(DashFixture {
        delay: Duration::from_millis(20),
        fail: false,
    })
    .await;

    let handles: Vec<_> = ["alpha.mp4", "beta.mp4", "gamma.mp4"]
        .into_iter()
        .map(|name| {
            let pipeline = env.pipeline.clone();
            tokio::spawn(async move { pipeline.ingest(name, Bytes::from_static(b"raw")).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let ids: Vec<String> = env
        .index
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id.to_string())
        .collect();
    assert_eq!(ids.len(), 3);
    for id in ["alpha", "beta", "gamma"] {
        assert!(ids.contains(&id.to_string()));
    }
}
