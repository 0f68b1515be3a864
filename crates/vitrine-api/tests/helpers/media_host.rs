//! In-memory media host that records every upload.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Mutex;
use vitrine_storage::{
    derive_variants, MediaHost, MediaHostBackend, MediaHostError, MediaHostResult, MediaUpload,
    UploadedMedia,
};

pub struct RecordingHost {
    uploads: Mutex<Vec<MediaUpload>>,
    reject_with: Option<(u16, String)>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            reject_with: None,
        }
    }

    /// A host that answers every upload with the given HTTP status.
    pub fn rejecting(status: u16, message: &str) -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            reject_with: Some((status, message.to_string())),
        }
    }

    pub fn uploads(&self) -> Vec<MediaUpload> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn last_data(&self) -> Bytes {
        self.uploads
            .lock()
            .unwrap()
            .last()
            .expect("no upload recorded")
            .data
            .clone()
    }
}

#[async_trait]
impl MediaHost for RecordingHost {
    async fn upload(&self, upload: MediaUpload) -> MediaHostResult<UploadedMedia> {
        if let Some((status, message)) = &self.reject_with {
            return Err(MediaHostError::Rejected {
                status: *status,
                message: message.clone(),
            });
        }

        let format = match upload.content_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/png" => "png",
            _ => "bin",
        }
        .to_string();
        let public_id = format!("{}/{}", upload.folder, upload.public_id);
        let secure_url = format!(
            "https://res.cloudinary.com/demo/image/upload/v1/{}.{}",
            public_id, format
        );
        let (web_url, thumb_url) =
            derive_variants(&secure_url, "f_auto,q_auto", "c_fill,g_face,w_480,h_320");
        let (width, height) = upload.dimensions.unwrap_or((0, 0));

        let stored = UploadedMedia {
            public_id,
            secure_url,
            web_url,
            thumb_url,
            bytes: upload.data.len() as u64,
            width,
            height,
            format,
        };
        self.uploads.lock().unwrap().push(upload);
        Ok(stored)
    }

    fn backend_type(&self) -> MediaHostBackend {
        MediaHostBackend::Local
    }
}
