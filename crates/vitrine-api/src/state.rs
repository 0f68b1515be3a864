use sqlx::SqlitePool;
use std::sync::Arc;
use vitrine_core::Config;
use vitrine_db::{ContentStore, MediaAssetRepository};
use vitrine_processing::ImageCompressor;
use vitrine_storage::MediaHost;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db_pool: SqlitePool,
    pub compressor: ImageCompressor,
    pub media_host: Arc<dyn MediaHost>,
    pub assets: MediaAssetRepository,
    pub content: ContentStore,
}

impl AppState {
    pub fn new(
        config: Config,
        db_pool: SqlitePool,
        compressor: ImageCompressor,
        media_host: Arc<dyn MediaHost>,
    ) -> Self {
        Self {
            config,
            assets: MediaAssetRepository::new(db_pool.clone()),
            content: ContentStore::new(db_pool.clone()),
            db_pool,
            compressor,
            media_host,
        }
    }
}
