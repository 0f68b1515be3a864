//! Media host abstraction
//!
//! A media host stores an uploaded image under a folder and public id and
//! hands back the public URLs the site renders.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vitrine_core::{AppError, MediaHostBackend};

/// Media host operation errors
#[derive(Debug, Error)]
pub enum MediaHostError {
    #[error("Upload rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Upload timed out: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response from media host: {0}")]
    InvalidResponse(String),

    #[error("Invalid public id: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for media host operations
pub type MediaHostResult<T> = Result<T, MediaHostError>;

impl From<MediaHostError> for AppError {
    fn from(err: MediaHostError) -> Self {
        match err {
            MediaHostError::ConfigError(msg) => AppError::Configuration(msg),
            other => AppError::UpstreamService(other.to_string()),
        }
    }
}

/// One image to store.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub data: Bytes,
    pub folder: String,
    pub public_id: String,
    pub tags: Vec<String>,
    pub content_type: String,
    /// Pixel size when the caller already knows it
    pub dimensions: Option<(u32, u32)>,
}

/// What the host reports back after storing an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedMedia {
    /// Full public id including the folder prefix
    pub public_id: String,
    pub secure_url: String,
    pub web_url: String,
    pub thumb_url: String,
    pub bytes: u64,
    pub width: u32,
    pub height: u32,
    pub format: String,
}

/// Media host abstraction
///
/// Uploads overwrite any existing asset with the same folder and public id.
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Store the image and return its URLs and reported metadata
    async fn upload(&self, upload: MediaUpload) -> MediaHostResult<UploadedMedia>;

    /// Get the media host backend type
    fn backend_type(&self) -> MediaHostBackend;
}
