//! External transcoder invocation (ffmpeg, MPEG-DASH output).

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use vodhub_core::TranscodeSettings;

/// Longest stderr tail kept in a failure.
const STDERR_TAIL_BYTES: usize = 4096;

#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transcoder exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// Converts one staged input into a DASH manifest plus segments written next to `manifest`.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, input: &Path, manifest: &Path) -> Result<(), TranscodeError>;
}

/// Fixed encoding and segmentation parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeProfile {
    pub video_codec: String,
    pub audio_codec: String,
    pub video_bitrate: String,
    pub audio_bitrate: String,
    pub b_frames: u32,
    pub keyframe_interval: u32,
    pub scene_change_threshold: u32,
    pub segment_duration: u32,
    pub init_segment_template: String,
    pub media_segment_template: String,
}

impl Default for TranscodeProfile {
    fn default() -> Self {
        TranscodeProfile::from(&TranscodeSettings::default())
    }
}

impl From<&TranscodeSettings> for TranscodeProfile {
    fn from(settings: &TranscodeSettings) -> Self {
        Self {
            video_codec: settings.video_codec.clone(),
            audio_codec: settings.audio_codec.clone(),
            video_bitrate: settings.video_bitrate.clone(),
            audio_bitrate: settings.audio_bitrate.clone(),
            b_frames: 1,
            keyframe_interval: settings.keyframe_interval,
            scene_change_threshold: 0,
            segment_duration: settings.segment_duration,
            init_segment_template: "init-$RepresentationID$.m4s".to_string(),
            media_segment_template: "chunk-$RepresentationID$-$Number%05d$.m4s".to_string(),
        }
    }
}

impl TranscodeProfile {
    /// Full ffmpeg argument vector. Only the two paths come from the caller.
    pub fn args(&self, input: &Path, manifest: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-nostdin", "-y", "-i"].iter().map(OsString::from).collect();
        args.push(input.as_os_str().to_owned());

        let keyframes = self.keyframe_interval.to_string();
        let options: [(&str, String); 14] = [
            ("-c:v", self.video_codec.clone()),
            ("-c:a", self.audio_codec.clone()),
            ("-bf", self.b_frames.to_string()),
            ("-keyint_min", keyframes.clone()),
            ("-g", keyframes),
            ("-sc_threshold", self.scene_change_threshold.to_string()),
            ("-b:v", self.video_bitrate.clone()),
            ("-b:a", self.audio_bitrate.clone()),
            ("-f", "dash".to_string()),
            ("-use_timeline", "1".to_string()),
            ("-use_template", "1".to_string()),
            ("-init_seg_name", self.init_segment_template.clone()),
            ("-media_seg_name", self.media_segment_template.clone()),
            ("-seg_duration", self.segment_duration.to_string()),
        ];
        for (flag, value) in options {
            args.push(flag.into());
            args.push(value.into());
        }

        args.push(manifest.as_os_str().to_owned());
        args
    }
}

/// Runs the ffmpeg binary as a child process.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
    profile: TranscodeProfile,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: impl Into<String>, profile: TranscodeProfile) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            profile,
        }
    }

    /// Check that the binary can be executed (`ffmpeg -version`).
    pub async fn verify(&self) -> Result<String, TranscodeError> {
        let output = Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|source| TranscodeError::Spawn {
                program: self.ffmpeg_path.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(TranscodeError::Failed {
                status: output.status.to_string(),
                stderr: String::new(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().to_string())
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    #[tracing::instrument(skip(self), fields(program = %self.ffmpeg_path))]
    async fn transcode(&self, input: &Path, manifest: &Path) -> Result<(), TranscodeError> {
        let start = std::time::Instant::now();

        let output = Command::new(&self.ffmpeg_path)
            .args(self.profile.args(input, manifest))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| TranscodeError::Spawn {
                program: self.ffmpeg_path.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = stderr_tail(&output.stderr);
            tracing::warn!(
                status = %output.status,
                duration_ms = start.elapsed().as_millis() as u64,
                "Transcoder exited with failure"
            );
            return Err(TranscodeError::Failed {
                status: output.status.to_string(),
                stderr,
            });
        }

        tracing::info!(
            duration_ms = start.elapsed().as_millis() as u64,
            "Transcode finished"
        );
        Ok(())
    }
}
