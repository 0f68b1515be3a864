use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use vitrine_core::AppError;

pub async fn list_content_keys(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, HttpAppError> {
    Ok(Json(state.content.keys().await?))
}

pub async fn get_content(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<Value>, HttpAppError> {
    state
        .content
        .get(&key)
        .await?
        .map(Json)
        .ok_or_else(|| HttpAppError(AppError::NotFound(format!("Content '{}' not found", key))))
}

/// Replace the whole document stored under `key`.
pub async fn put_content(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    ValidatedJson(document): ValidatedJson<Value>,
) -> Result<Json<Value>, HttpAppError> {
    state.content.put(&key, document.clone()).await?;
    tracing::info!(key = %key, "Content document saved");
    Ok(Json(document))
}
