use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An image stored on the media host. Only URLs and basic metadata are kept
/// locally, never the bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaAsset {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub public_id: String,
    pub secure_url: String,
    /// Optimized variant (`f_auto,q_auto`)
    pub web_url: String,
    /// Thumbnail variant (`c_fill,g_face,w_480,h_320`)
    pub thumb_url: String,
    pub bytes_size: u64,
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub tags_csv: String,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MediaAsset {
    /// URL to embed in pages: the optimized variant when present.
    pub fn url(&self) -> &str {
        if self.web_url.is_empty() {
            &self.secure_url
        } else {
            &self.web_url
        }
    }

    pub fn tags(&self) -> Vec<&str> {
        self.tags_csv
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Fields supplied when registering a freshly uploaded asset.
#[derive(Debug, Clone)]
pub struct NewMediaAsset {
    pub title: String,
    pub public_id: String,
    pub secure_url: String,
    pub web_url: String,
    pub thumb_url: String,
    pub bytes_size: u64,
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub tags: Vec<String>,
}
