use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub media_host: String,
    pub database: String,
    pub assets: Option<i64>,
}

/// Reports `degraded` when the database cannot be queried.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let assets = match state.assets.count().await {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            None
        }
    };
    let healthy = assets.is_some();

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        media_host: state.media_host.backend_type().to_string(),
        database: if healthy { "ok" } else { "unavailable" }.to_string(),
        assets,
    })
}
