//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use vitrine_core::Config;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry();

    // Fail fast on misconfiguration
    config
        .compression
        .validate()
        .context("Invalid compression configuration")?;
    config
        .media_host
        .validate()
        .context("Invalid media host configuration")?;

    tracing::info!("Configuration loaded and validated successfully");

    let db_pool = database::setup_database(&config).await?;
    let state = services::initialize_services(&config, db_pool).await?;
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
