use crate::error::{log_error, status_of};
use crate::state::AppState;
use crate::utils::upload::extract_upload_form;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use vitrine_core::models::{NewMediaAsset, UploadResponse, UploadSuccess};
use vitrine_core::slug::public_id_from_filename;
use vitrine_core::{AppError, ErrorMetadata};
use vitrine_storage::{MediaUpload, UploadedMedia};

/// `POST /dashboard/upload-image`
///
/// Compresses the file when it exceeds the size cap, hands it to the media
/// host and registers the resulting asset. Failures keep the status code of
/// the underlying error but always answer with `{success: false, error}`.
pub async fn upload_image(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    match process_upload(&state, multipart).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => {
            log_error(&err);
            (
                status_of(&err),
                Json(UploadResponse::failure(err.client_message())),
            )
                .into_response()
        }
    }
}

async fn process_upload(
    state: &AppState,
    multipart: Multipart,
) -> Result<UploadResponse, AppError> {
    let form = extract_upload_form(multipart).await?;

    let public_id = public_id_from_filename(&form.filename);
    let folder = form
        .folder
        .clone()
        .unwrap_or_else(|| state.config.upload.default_folder.clone());
    let original_size = form.data.len();

    let compressor = state.compressor.clone();
    let data = form.data.clone();
    let prepared = tokio::task::spawn_blocking(move || compressor.prepare(data))
        .await
        .map_err(|e| AppError::Internal(format!("Compression task failed: {}", e)))??;

    match prepared.compression() {
        Some(result) => tracing::info!(
            filename = %form.filename,
            original_size = original_size,
            compressed_size = result.size(),
            format = %result.format,
            quality = result.quality,
            "Upload compressed before hosting"
        ),
        None => tracing::debug!(
            filename = %form.filename,
            size = original_size,
            declared_type = form.content_type.as_deref().unwrap_or("unknown"),
            "Upload forwarded unchanged"
        ),
    }

    let upload = MediaUpload {
        content_type: prepared.content_type().to_string(),
        dimensions: Some(prepared.dimensions()),
        data: prepared.into_data(),
        folder,
        public_id,
        tags: form.tags.clone(),
    };
    let uploaded = state.media_host.upload(upload).await?;

    let new_asset = NewMediaAsset {
        title: form.filename.clone(),
        public_id: uploaded.public_id.clone(),
        secure_url: uploaded.secure_url.clone(),
        web_url: uploaded.web_url.clone(),
        thumb_url: uploaded.thumb_url.clone(),
        bytes_size: uploaded.bytes,
        width: uploaded.width,
        height: uploaded.height,
        format: uploaded.format.clone(),
        tags: form.tags,
    };

    // The image is already hosted; a registry failure must not fail the upload
    match state.assets.create(new_asset).await {
        Ok(asset) => Ok(UploadResponse::from(&asset)),
        Err(e) => {
            tracing::warn!(
                error = %e,
                public_id = %uploaded.public_id,
                "Failed to register media asset"
            );
            Ok(unregistered_response(form.filename, uploaded))
        }
    }
}

fn unregistered_response(title: String, uploaded: UploadedMedia) -> UploadResponse {
    UploadResponse::Success(UploadSuccess {
        success: true,
        id: Uuid::nil(),
        title,
        secure_url: uploaded.secure_url,
        web_url: uploaded.web_url,
        thumb_url: uploaded.thumb_url,
        public_id: uploaded.public_id,
        width: uploaded.width,
        height: uploaded.height,
        format: uploaded.format,
        bytes: uploaded.bytes,
    })
}
