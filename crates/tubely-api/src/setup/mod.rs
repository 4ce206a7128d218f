//! Application setup and initialization

pub mod database;
pub mod media_tools;
pub mod routes;
pub mod server;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(&config.log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment,
        metadata_store = ?config.metadata_store,
        storage_backend = %config.storage_backend,
        "Configuration loaded and validated successfully"
    );

    let videos = database::setup_video_repository(&config).await?;
    let storage = storage::setup_storage(&config).await?;
    let tools = media_tools::setup_media_tools(&config).await?;

    let state = Arc::new(AppState::new(config, videos, storage, tools));

    let router = routes::setup_routes(state.clone())?;

    Ok((state, router))
}
