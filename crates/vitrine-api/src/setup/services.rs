use crate::state::AppState;
use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::sync::Arc;
use vitrine_core::Config;
use vitrine_db::ContentStore;
use vitrine_processing::ImageCompressor;
use vitrine_storage::create_media_host;

/// Build the compressor, media host and stores shared by all handlers.
pub async fn initialize_services(config: &Config, db_pool: SqlitePool) -> Result<Arc<AppState>> {
    let compressor = ImageCompressor::new(config.compression.clone())
        .context("Failed to create image compressor")?;

    let media_host = create_media_host(&config.media_host)
        .await
        .context("Failed to create media host")?;

    let state = AppState::new(config.clone(), db_pool, compressor, media_host);
    seed_content(config, &state.content).await?;

    Ok(Arc::new(state))
}

/// Insert the documents from `CONTENT_SEED_PATH` that are not stored yet.
async fn seed_content(config: &Config, content: &ContentStore) -> Result<()> {
    let Some(path) = config.base.content_seed_path.as_deref() else {
        return Ok(());
    };

    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read content seed {}", path))?;
    let documents =
        ContentStore::parse_seed(&json).with_context(|| format!("Invalid content seed {}", path))?;
    let inserted = content
        .seed(&documents)
        .await
        .context("Failed to store content seed")?;

    tracing::info!(
        path = %path,
        documents = documents.len(),
        inserted = inserted,
        "Content seed applied"
    );
    Ok(())
}
