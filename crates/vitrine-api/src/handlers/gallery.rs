//! Dashboard gallery: the registry of hosted assets.
//!
//! Deleting an asset only removes it from the registry; the hosted file is
//! left on the media host.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use vitrine_core::models::MediaAsset;

/// `GET /dashboard/gallery`: active assets, newest first
pub async fn list_gallery(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MediaAsset>>, HttpAppError> {
    let assets = state.assets.list_active().await?;
    Ok(Json(assets))
}

pub async fn toggle_active(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MediaAsset>, HttpAppError> {
    let asset = state.assets.toggle_active(id).await?;
    tracing::info!(asset_id = %id, is_active = asset.is_active, "Media asset toggled");
    Ok(Json(asset))
}

pub async fn delete_asset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    state.assets.delete(id).await?;
    tracing::info!(asset_id = %id, "Media asset removed from registry");
    Ok(StatusCode::NO_CONTENT)
}
