//! Application setup and initialization
//!
//! Everything `main` needs to go from a `Config` to a served router, split so tests can
//! assemble the same router around their own collaborators.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;
pub mod validation;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use vodhub_core::Config;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry()
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    validation::validate_config(&config).context("Configuration validation failed")?;
    tracing::info!("Configuration loaded and validated successfully");

    let index = Arc::new(database::setup_database(&config).await?);
    let store = storage::setup_storage(&config).await?;
    let staging = storage::setup_staging(&config).await?;
    let transcoder = services::setup_transcoder(&config).await;

    let state = services::initialize_services(&config, index, store, transcoder, staging);

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
