//! Cloudinary upload client.
//!
//! Uploads go to the signed REST endpoint `POST /v1_1/{cloud}/image/upload`.
//! The signature is the SHA-256 of the alphabetically sorted `key=value`
//! parameters joined by `&`, followed by the API secret.

use crate::traits::{MediaHost, MediaHostError, MediaHostResult, MediaUpload, UploadedMedia};
use crate::variants::derive_variants;
use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use vitrine_core::{CloudinaryCredentials, MediaHostBackend, MediaHostConfig};

pub const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com";

pub struct CloudinaryHost {
    http_client: reqwest::Client,
    credentials: CloudinaryCredentials,
    api_base: String,
    web_transformation: String,
    thumb_transformation: String,
    eager_max_width: u32,
}

impl Debug for CloudinaryHost {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CloudinaryHost")
            .field("cloud_name", &self.credentials.cloud_name)
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
    #[serde(default)]
    bytes: u64,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    format: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

impl CloudinaryHost {
    pub fn new(config: &MediaHostConfig) -> MediaHostResult<Self> {
        let credentials = config.cloudinary.clone().ok_or_else(|| {
            MediaHostError::ConfigError(
                "Cloudinary credentials are not configured (set CLOUDINARY_URL)".to_string(),
            )
        })?;

        let http_client = reqwest::Client::builder()
            .timeout(config.upload_timeout)
            .build()
            .map_err(|e| {
                MediaHostError::ConfigError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            credentials,
            api_base: config
                .cloudinary_api_base
                .clone()
                .unwrap_or_else(|| CLOUDINARY_API_BASE.to_string()),
            web_transformation: config.web_transformation.clone(),
            thumb_transformation: config.thumb_transformation.clone(),
            eager_max_width: config.eager_max_width,
        })
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.api_base.trim_end_matches('/'),
            self.credentials.cloud_name
        )
    }

    /// Eager derived variant: WEBP, automatic quality, width limited.
    fn eager_transformation(&self) -> String {
        format!("c_limit,f_auto,q_auto,w_{}/webp", self.eager_max_width)
    }

    /// Parameters covered by the signature.
    fn signed_params(
        &self,
        upload: &MediaUpload,
        timestamp: i64,
    ) -> BTreeMap<&'static str, String> {
        let mut params = BTreeMap::new();
        params.insert("eager", self.eager_transformation());
        params.insert("overwrite", "true".to_string());
        params.insert("public_id", upload.public_id.clone());
        params.insert("timestamp", timestamp.to_string());
        params.insert("unique_filename", "false".to_string());
        params.insert("use_filename", "false".to_string());

        let folder = upload.folder.trim_matches('/');
        if !folder.is_empty() {
            params.insert("folder", folder.to_string());
        }

        let tags = upload
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        if !tags.is_empty() {
            params.insert("tags", tags);
        }

        params
    }

    pub fn sign(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
        let to_sign = params
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn map_send_error(&self, err: reqwest::Error) -> MediaHostError {
        if err.is_timeout() {
            MediaHostError::Timeout(format!("no response from Cloudinary: {}", err))
        } else {
            MediaHostError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl MediaHost for CloudinaryHost {
    async fn upload(&self, upload: MediaUpload) -> MediaHostResult<UploadedMedia> {
        let params = self.signed_params(&upload, chrono::Utc::now().timestamp());
        let signature = Self::sign(&params, &self.credentials.api_secret);
        let size = upload.data.len();

        // Bytes is reference-counted; the payload is streamed without a copy
        let file_part = reqwest::multipart::Part::stream_with_length(
            reqwest::Body::from(upload.data),
            size as u64,
        )
            .file_name(upload.public_id.clone())
            .mime_str(&upload.content_type)
            .map_err(|e| MediaHostError::Transport(format!("Invalid content type: {}", e)))?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("api_key", self.credentials.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let start = std::time::Instant::now();
        let response = self
            .http_client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| {
                    if body.is_empty() {
                        "Unknown error".to_string()
                    } else {
                        body
                    }
                });
            tracing::warn!(
                status = status.as_u16(),
                public_id = %upload.public_id,
                error = %message,
                "Cloudinary rejected upload"
            );
            return Err(MediaHostError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let result: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaHostError::InvalidResponse(e.to_string()))?;

        let (web_url, thumb_url) = derive_variants(
            &result.secure_url,
            &self.web_transformation,
            &self.thumb_transformation,
        );

        tracing::info!(
            public_id = %result.public_id,
            size_bytes = size,
            stored_bytes = result.bytes,
            width = result.width,
            height = result.height,
            duration_ms = start.elapsed().as_millis() as u64,
            "Image uploaded to Cloudinary"
        );

        Ok(UploadedMedia {
            public_id: result.public_id,
            secure_url: result.secure_url,
            web_url,
            thumb_url,
            bytes: result.bytes,
            width: result.width,
            height: result.height,
            format: result.format,
        })
    }

    fn backend_type(&self) -> MediaHostBackend {
        MediaHostBackend::Cloudinary
    }
}
