//! Metadata index setup

use anyhow::{Context, Result};
use std::time::Duration;
use vodhub_core::Config;
use vodhub_db::{connect, VideoRepository, MIGRATOR};

/// Open the SQLite pool, apply pending migrations and wrap it in the repository.
pub async fn setup_database(config: &Config) -> Result<VideoRepository> {
    tracing::info!("Connecting to database...");
    let pool = connect(
        &config.database_url,
        config.db_max_connections,
        Duration::from_secs(config.db_timeout_seconds),
    )
    .await
    .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.db_max_connections,
        "Database connected successfully"
    );

    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(VideoRepository::new(pool))
}
