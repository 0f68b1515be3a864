//! Image slot population from the pool of active asset URLs.

use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;
use vitrine_core::image_slots::{ImageUrlPool, PopulateOutcome, PopulateRequest, SlotReport};

pub async fn list_image_urls(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ImageUrlPool>, HttpAppError> {
    let urls = state.assets.active_urls().await?;
    Ok(Json(ImageUrlPool {
        count: urls.len(),
        urls,
    }))
}

pub async fn image_slot_report(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SlotReport>, HttpAppError> {
    let pool = state.assets.active_urls().await?;
    Ok(Json(state.content.image_slot_report(pool.len()).await?))
}

/// `POST /dashboard/image-urls/populate`
///
/// With `dry_run` the changes are computed and returned but not written.
pub async fn populate_image_urls(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<PopulateRequest>,
) -> Result<Json<PopulateOutcome>, HttpAppError> {
    let pool = state.assets.active_urls().await?;
    let changes = state
        .content
        .populate_image_slots(&pool, request.mode, request.dry_run)
        .await?;

    Ok(Json(PopulateOutcome {
        mode: request.mode,
        dry_run: request.dry_run,
        pool_size: pool.len(),
        changes_count: changes.len(),
        changes,
    }))
}
