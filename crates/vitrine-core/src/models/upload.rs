use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::media_asset::MediaAsset;

/// Body returned by the upload endpoint: `success` discriminates the two shapes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum UploadResponse {
    Success(UploadSuccess),
    Failure(UploadFailure),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadSuccess {
    pub success: bool,
    pub id: Uuid,
    pub title: String,
    pub secure_url: String,
    pub web_url: String,
    pub thumb_url: String,
    pub public_id: String,
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadFailure {
    pub success: bool,
    pub error: String,
}

impl UploadResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        UploadResponse::Failure(UploadFailure {
            success: false,
            error: error.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadResponse::Success(_))
    }
}

impl From<&MediaAsset> for UploadResponse {
    fn from(asset: &MediaAsset) -> Self {
        UploadResponse::Success(UploadSuccess {
            success: true,
            id: asset.id,
            title: asset.title.clone(),
            secure_url: asset.secure_url.clone(),
            web_url: asset.web_url.clone(),
            thumb_url: asset.thumb_url.clone(),
            public_id: asset.public_id.clone(),
            width: asset.width,
            height: asset.height,
            format: asset.format.clone(),
            bytes: asset.bytes_size,
        })
    }
}
