//! Startup configuration checks
//!
//! `Config::validate` covers individual values. The checks here look at how settings
//! combine and at the environment the process runs in.

use anyhow::Result;
use vodhub_core::{Config, StorageBackend};

pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();
    let env_var = std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .ok();

    if is_production && env_var.is_none() {
        tracing::warn!(
            "Production mode detected but ENVIRONMENT/APP_ENV not set - error details may leak"
        );
    }

    if config.storage_backend == StorageBackend::Local
        && config.staging_dir.starts_with(&config.content_root)
    {
        return Err(anyhow::anyhow!(
            "STAGING_DIR ({}) must not be inside CONTENT_ROOT ({})",
            config.staging_dir.display(),
            config.content_root.display()
        ));
    }

    if is_production && config.storage_backend == StorageBackend::Memory {
        tracing::warn!("Memory content store in production - published videos are lost on restart");
    }

    if is_production && config.database_url.contains(":memory:") {
        tracing::warn!("In-memory database in production - the video index is lost on restart");
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}
