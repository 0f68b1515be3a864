use crate::{CloudinaryHost, LocalMediaHost, MediaHost, MediaHostResult};
use std::sync::Arc;
use vitrine_core::{MediaHostBackend, MediaHostConfig};

/// Create a media host based on configuration
pub async fn create_media_host(config: &MediaHostConfig) -> MediaHostResult<Arc<dyn MediaHost>> {
    match config.backend {
        MediaHostBackend::Cloudinary => {
            let host = CloudinaryHost::new(config)?;
            tracing::info!(host = ?host, "Using Cloudinary media host");
            Ok(Arc::new(host))
        }
        MediaHostBackend::Local => {
            let host = LocalMediaHost::from_config(config).await?;
            tracing::info!(host = ?host, "Using local filesystem media host");
            Ok(Arc::new(host))
        }
    }
}
