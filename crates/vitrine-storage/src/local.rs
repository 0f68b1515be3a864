use crate::traits::{MediaHost, MediaHostError, MediaHostResult, MediaUpload, UploadedMedia};
use crate::variants::derive_variants;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use vitrine_core::{MediaHostBackend, MediaHostConfig};

/// Local filesystem media host for development and tests
#[derive(Clone, Debug)]
pub struct LocalMediaHost {
    base_path: PathBuf,
    base_url: String,
    web_transformation: String,
    thumb_transformation: String,
}

impl LocalMediaHost {
    /// Create a new LocalMediaHost instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for stored images (e.g., "/var/lib/vitrine/media")
    /// * `base_url` - Base URL the directory is served under (e.g., "http://localhost:8000/media")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> MediaHostResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            MediaHostError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        let defaults = MediaHostConfig::default();
        Ok(LocalMediaHost {
            base_path,
            base_url,
            web_transformation: defaults.web_transformation,
            thumb_transformation: defaults.thumb_transformation,
        })
    }

    pub async fn from_config(config: &MediaHostConfig) -> MediaHostResult<Self> {
        let base_path = config.local_storage_path.clone().ok_or_else(|| {
            MediaHostError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
        })?;
        let base_url = config.local_storage_base_url.clone().ok_or_else(|| {
            MediaHostError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
        })?;

        let mut host = Self::new(base_path, base_url).await?;
        host.web_transformation = config.web_transformation.clone();
        host.thumb_transformation = config.thumb_transformation.clone();
        Ok(host)
    }

    /// Reject keys that could escape the base directory.
    fn validate_key(key: &str) -> MediaHostResult<()> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') || key.contains('\\') {
            return Err(MediaHostError::InvalidKey(format!(
                "Key contains invalid characters: {}",
                key
            )));
        }
        Ok(())
    }

    fn storage_key(upload: &MediaUpload) -> MediaHostResult<String> {
        let folder = upload.folder.trim_matches('/');
        Self::validate_key(&upload.public_id)?;
        if upload.public_id.contains('/') {
            return Err(MediaHostError::InvalidKey(
                "Public id must not contain '/'".to_string(),
            ));
        }
        if folder.is_empty() {
            return Ok(upload.public_id.clone());
        }
        Self::validate_key(folder)?;
        Ok(format!("{}/{}", folder, upload.public_id))
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> MediaHostResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

/// File extension for a stored image, from its content type.
pub(crate) fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/tiff" => "tiff",
        "image/bmp" => "bmp",
        _ => "bin",
    }
}

#[async_trait]
impl MediaHost for LocalMediaHost {
    async fn upload(&self, upload: MediaUpload) -> MediaHostResult<UploadedMedia> {
        let public_id = Self::storage_key(&upload)?;
        let extension = extension_for(&upload.content_type);
        let key = format!("{}.{}", public_id, extension);
        let path = self.base_path.join(&key);
        let size = upload.data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            MediaHostError::Transport(format!("Failed to create file {}: {}", path.display(), e))
        })?;
        file.write_all(&upload.data).await.map_err(|e| {
            MediaHostError::Transport(format!("Failed to write file {}: {}", path.display(), e))
        })?;
        file.sync_all().await.map_err(|e| {
            MediaHostError::Transport(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        let secure_url = self.generate_url(&key);
        let (web_url, thumb_url) = derive_variants(
            &secure_url,
            &self.web_transformation,
            &self.thumb_transformation,
        );
        let (width, height) = upload.dimensions.unwrap_or((0, 0));

        tracing::info!(
            public_id = %public_id,
            path = %path.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_millis() as u64,
            "Image stored on local filesystem"
        );

        Ok(UploadedMedia {
            public_id,
            secure_url,
            web_url,
            thumb_url,
            bytes: size as u64,
            width,
            height,
            format: extension.to_string(),
        })
    }

    fn backend_type(&self) -> MediaHostBackend {
        MediaHostBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn upload(folder: &str, public_id: &str, data: &'static [u8]) -> MediaUpload {
        MediaUpload {
            data: Bytes::from_static(data),
            folder: folder.to_string(),
            public_id: public_id.to_string(),
            tags: vec!["hero".to_string()],
            content_type: "image/jpeg".to_string(),
            dimensions: Some((640, 480)),
        }
    }

    #[tokio::test]
    async fn test_upload_writes_file_and_builds_urls() {
        let dir = tempfile::tempdir().unwrap();
        let host = LocalMediaHost::new(dir.path(), "http://localhost:8000/media/".to_string())
            .await
            .unwrap();

        let stored = host
            .upload(upload("vitrine/uploads", "hero-image", b"jpeg bytes"))
            .await
            .unwrap();

        assert_eq!(stored.public_id, "vitrine/uploads/hero-image");
        assert_eq!(
            stored.secure_url,
            "http://localhost:8000/media/vitrine/uploads/hero-image.jpg"
        );
        assert_eq!(stored.web_url, stored.secure_url);
        assert_eq!(stored.thumb_url, stored.secure_url);
        assert_eq!((stored.width, stored.height), (640, 480));
        assert_eq!(stored.bytes, 10);
        assert_eq!(stored.format, "jpg");

        let on_disk = std::fs::read(dir.path().join("vitrine/uploads/hero-image.jpg")).unwrap();
        assert_eq!(on_disk, b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_upload_overwrites_same_public_id() {
        let dir = tempfile::tempdir().unwrap();
        let host = LocalMediaHost::new(dir.path(), "http://localhost/media".to_string())
            .await
            .unwrap();

        host.upload(upload("f", "logo", b"first")).await.unwrap();
        host.upload(upload("f", "logo", b"second")).await.unwrap();

        let on_disk = std::fs::read(dir.path().join("f/logo.jpg")).unwrap();
        assert_eq!(on_disk, b"second");
    }

    #[tokio::test]
    async fn test_upload_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let host = LocalMediaHost::new(dir.path(), "http://localhost/media".to_string())
            .await
            .unwrap();

        let result = host.upload(upload("../outside", "x", b"data")).await;
        assert!(matches!(result, Err(MediaHostError::InvalidKey(_))));

        let result = host.upload(upload("/abs", "x", b"data")).await;
        assert!(result.is_ok(), "leading slashes on the folder are trimmed");

        let result = host.upload(upload("ok", "a/b", b"data")).await;
        assert!(matches!(result, Err(MediaHostError::InvalidKey(_))));
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/webp"), "webp");
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("application/octet-stream"), "bin");
    }
}
