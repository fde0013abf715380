//! Configuration module
//!
//! Settings are read from the environment (after loading `.env` through `dotenvy`)
//! with a default for every value, then checked by [`Config::validate`].

use std::env;
use std::path::PathBuf;

use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 5;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_UPLOAD_SIZE_MB: usize = 500;
const STAGING_MAX_AGE_SECS: u64 = 86_400;

/// Encoding parameters handed to the transcoder.
///
/// Every value ends up as a single argument on the ffmpeg command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscodeSettings {
    pub video_codec: String,
    pub audio_codec: String,
    pub video_bitrate: String,
    pub audio_bitrate: String,
    pub keyframe_interval: u32,
    pub segment_duration: u32,
}

impl Default for TranscodeSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            video_bitrate: "3000k".to_string(),
            audio_bitrate: "128k".to_string(),
            keyframe_interval: 120,
            segment_duration: 4,
        }
    }
}

impl TranscodeSettings {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            video_codec: env::var("TRANSCODE_VIDEO_CODEC").unwrap_or(defaults.video_codec),
            audio_codec: env::var("TRANSCODE_AUDIO_CODEC").unwrap_or(defaults.audio_codec),
            video_bitrate: env::var("TRANSCODE_VIDEO_BITRATE").unwrap_or(defaults.video_bitrate),
            audio_bitrate: env::var("TRANSCODE_AUDIO_BITRATE").unwrap_or(defaults.audio_bitrate),
            keyframe_interval: env::var("TRANSCODE_KEYFRAME_INTERVAL")
                .unwrap_or_else(|_| defaults.keyframe_interval.to_string())
                .parse()
                .unwrap_or(defaults.keyframe_interval),
            segment_duration: env::var("TRANSCODE_SEGMENT_DURATION")
                .unwrap_or_else(|_| defaults.segment_duration.to_string())
                .parse()
                .unwrap_or(defaults.segment_duration),
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let params = [
            ("TRANSCODE_VIDEO_CODEC", &self.video_codec),
            ("TRANSCODE_AUDIO_CODEC", &self.audio_codec),
            ("TRANSCODE_VIDEO_BITRATE", &self.video_bitrate),
            ("TRANSCODE_AUDIO_BITRATE", &self.audio_bitrate),
        ];
        for (name, value) in params {
            if value.is_empty() {
                return Err(anyhow::anyhow!("{} must not be empty", name));
            }
            if value.starts_with('-') || value.chars().any(char::is_whitespace) {
                return Err(anyhow::anyhow!(
                    "{} must be a single value without whitespace or a leading '-'",
                    name
                ));
            }
        }

        if self.keyframe_interval == 0 {
            return Err(anyhow::anyhow!("TRANSCODE_KEYFRAME_INTERVAL must be positive"));
        }
        if self.segment_duration == 0 {
            return Err(anyhow::anyhow!("TRANSCODE_SEGMENT_DURATION must be positive"));
        }

        Ok(())
    }
}

/// Convert the `MAX_UPLOAD_SIZE_MB` setting to bytes.
fn upload_limit_bytes(megabytes: usize) -> Result<usize, anyhow::Error> {
    megabytes
        .checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB is too large: {}", megabytes))
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub storage_backend: StorageBackend,
    pub content_root: PathBuf,
    pub staging_dir: PathBuf,
    pub staging_max_age_secs: u64,
    pub max_upload_size_bytes: usize,
    pub video_allowed_extensions: Vec<String>,
    pub ffmpeg_path: String,
    pub transcode: TranscodeSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .parse::<StorageBackend>()?;

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://vodhub.db".to_string()),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_backend,
            content_root: env::var("CONTENT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./content")),
            staging_dir: env::var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir().join("vodhub-staging")),
            staging_max_age_secs: env::var("STAGING_MAX_AGE_SECS")
                .unwrap_or_else(|_| STAGING_MAX_AGE_SECS.to_string())
                .parse()
                .unwrap_or(STAGING_MAX_AGE_SECS),
            max_upload_size_bytes: upload_limit_bytes(
                env::var("MAX_UPLOAD_SIZE_MB")
                    .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
                    .parse::<usize>()
                    .unwrap_or(MAX_UPLOAD_SIZE_MB),
            )?,
            video_allowed_extensions: env::var("VIDEO_ALLOWED_EXTENSIONS")
                .unwrap_or_else(|_| "mp4,mov,webm,mkv,avi".to_string())
                .split(',')
                .map(|s| s.trim().trim_start_matches('.').to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            transcode: TranscodeSettings::from_env(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if !self.database_url.starts_with("sqlite:") {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid SQLite connection string (sqlite://...)"
            ));
        }

        if self.db_max_connections == 0 {
            return Err(anyhow::anyhow!("DB_MAX_CONNECTIONS must be at least 1"));
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be at least 1"));
        }

        if self.video_allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!(
                "VIDEO_ALLOWED_EXTENSIONS must list at least one extension"
            ));
        }

        if self.ffmpeg_path.trim().is_empty() {
            return Err(anyhow::anyhow!("FFMPEG_PATH must not be empty"));
        }

        self.transcode.validate()
    }
}
