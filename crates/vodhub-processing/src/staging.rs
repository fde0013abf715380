//! Per-attempt staging directories.
//!
//! Each ingestion attempt gets a private `ingest-XXXXXX` directory under the staging
//! root. The raw upload and everything the transcoder writes live there until the
//! attempt ends. [`StagingDir::destroy`] removes it and reports the outcome; dropping a
//! `StagingDir` removes it too, so early returns, panics and cancelled tasks never
//! leak a directory. Directories orphaned by a crashed process are swept at startup
//! by [`StagingArea::remove_stale`].

use futures::stream::{self, Stream};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use tokio::fs;

use vodhub_core::MANIFEST_FILENAME;

const STAGING_PREFIX: &str = "ingest-";

/// File stem of the staged upload. Transcoder outputs never use it.
const INPUT_STEM: &str = "input";

/// Root under which staging directories are allocated.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Allocate a fresh, uniquely named staging directory.
    pub async fn create(&self) -> io::Result<StagingDir> {
        fs::create_dir_all(&self.root).await?;

        let root = self.root.clone();
        let dir = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(STAGING_PREFIX)
                .tempdir_in(root)
        })
        .await
        .map_err(io::Error::other)??;

        tracing::debug!(path = %dir.path().display(), "Staging directory created");

        Ok(StagingDir { dir, input: None })
    }

    /// Remove staging directories older than `max_age`. Returns how many were removed.
    pub async fn remove_stale(&self, max_age: Duration) -> io::Result<usize> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let now = SystemTime::now();
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if !name.to_string_lossy().starts_with(STAGING_PREFIX) {
                continue;
            }
            let metadata = entry.metadata().await?;
            if !metadata.is_dir() {
                continue;
            }
            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();
            if age < max_age {
                continue;
            }

            match fs::remove_dir_all(entry.path()).await {
                Ok(()) => {
                    removed += 1;
                    tracing::info!(
                        path = %entry.path().display(),
                        age_secs = age.as_secs(),
                        "Removed stale staging directory"
                    );
                }
                Err(e) => tracing::warn!(
                    path = %entry.path().display(),
                    error = %e,
                    "Failed to remove stale staging directory"
                ),
            }
        }

        Ok(removed)
    }
}

/// A file produced by the transcoder inside a staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArtifact {
    pub file_name: String,
    pub path: PathBuf,
}

/// One attempt's private working directory.
#[derive(Debug)]
pub struct StagingDir {
    dir: TempDir,
    input: Option<PathBuf>,
}

impl StagingDir {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write the raw upload into the directory as `input.{extension}`.
    ///
    /// The name is fixed so an uploaded file can never shadow a transcoder output.
    pub async fn put_input(&mut self, extension: &str, data: &[u8]) -> io::Result<PathBuf> {
        let path = self.dir.path().join(format!("{}.{}", INPUT_STEM, extension));
        fs::write(&path, data).await?;
        self.input = Some(path.clone());
        Ok(path)
    }

    /// Where the transcoder is told to write the manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.path().join(MANIFEST_FILENAME)
    }

    /// Regular files in the directory other than the staged input, read lazily.
    pub fn outputs(&self) -> impl Stream<Item = io::Result<StagedArtifact>> + '_ {
        let input_name: Option<OsString> = self
            .input
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_os_string());

        stream::try_unfold(None, move |entries: Option<fs::ReadDir>| {
            let input_name = input_name.clone();
            async move {
                let mut entries = match entries {
                    Some(entries) => entries,
                    None => fs::read_dir(self.path()).await?,
                };
                while let Some(entry) = entries.next_entry().await? {
                    if !entry.file_type().await?.is_file() {
                        continue;
                    }
                    let name = entry.file_name();
                    if input_name.as_ref() == Some(&name) {
                        continue;
                    }
                    let artifact = StagedArtifact {
                        file_name: name.to_string_lossy().into_owned(),
                        path: entry.path(),
                    };
                    return Ok(Some((artifact, Some(entries))));
                }
                Ok::<_, io::Error>(None)
            }
        })
    }

    /// Remove the directory and everything in it.
    pub async fn destroy(self) -> io::Result<()> {
        let path = self.dir.path().to_path_buf();
        tokio::task::spawn_blocking(move || self.dir.close())
            .await
            .map_err(io::Error::other)??;
        tracing::debug!(path = %path.display(), "Staging directory removed");
        Ok(())
    }
}
