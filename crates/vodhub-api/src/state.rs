//! Application state shared by all handlers.

use std::sync::Arc;
use vodhub_core::Config;
use vodhub_db::MetadataIndex;
use vodhub_processing::{ContentResolver, IngestionPipeline};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub index: Arc<dyn MetadataIndex>,
    pub pipeline: Arc<IngestionPipeline>,
    pub resolver: ContentResolver,
}
