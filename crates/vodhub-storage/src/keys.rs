//! Shared key generation for storage backends.
//!
//! Key format: `videos/{video_id}/{filename}`.

use vodhub_core::{ArtifactName, VideoId};

const NAMESPACE_ROOT: &str = "videos";

/// Key prefix that owns every artifact of one video.
pub fn namespace_key(video_id: &VideoId) -> String {
    format!("{}/{}", NAMESPACE_ROOT, video_id)
}

/// Storage key for a single artifact.
pub fn content_key(video_id: &VideoId, filename: &ArtifactName) -> String {
    format!("{}/{}/{}", NAMESPACE_ROOT, video_id, filename)
}
