//! Content store and staging setup

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use vodhub_core::Config;
use vodhub_processing::StagingArea;
use vodhub_storage::{create_content_store, ContentStore};

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn ContentStore>> {
    tracing::info!("Initializing content store...");
    let store = create_content_store(config)
        .await
        .context("Failed to initialize content store")?;
    tracing::info!(
        backend = ?store.backend_type(),
        "Content store initialized successfully"
    );
    Ok(store)
}

/// Prepare the staging root and sweep directories left behind by an earlier process.
pub async fn setup_staging(config: &Config) -> Result<StagingArea> {
    let staging = StagingArea::new(&config.staging_dir);
    let removed = staging
        .remove_stale(Duration::from_secs(config.staging_max_age_secs))
        .await
        .with_context(|| {
            format!(
                "Failed to sweep staging directory {}",
                config.staging_dir.display()
            )
        })?;

    tracing::info!(
        staging_dir = %config.staging_dir.display(),
        removed_stale = removed,
        "Staging area ready"
    );
    Ok(staging)
}
