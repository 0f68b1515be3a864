//! Multipart parsing for the upload endpoint

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::Bytes;
use vitrine_core::AppError;

/// Fields of the dashboard upload form.
#[derive(Debug)]
pub struct UploadForm {
    pub data: Bytes,
    pub filename: String,
    pub content_type: Option<String>,
    pub folder: Option<String>,
    pub tags: Vec<String>,
}

/// Extract the `file`, `folder` and `tags` fields from the form.
/// Exactly one field named "file" is accepted; unknown fields are ignored.
pub async fn extract_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut file: Option<(Bytes, Option<String>, Option<String>)> = None;
    let mut folder: Option<String> = None;
    let mut tags: Vec<String> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read multipart", e))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            "file" => {
                if file.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    ));
                }
                let filename = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("Failed to read file data", e))?;
                file = Some((data, filename, content_type));
            }
            "folder" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error("Failed to read folder", e))?;
                let value = value.trim();
                if !value.is_empty() {
                    folder = Some(value.to_string());
                }
            }
            "tags" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error("Failed to read tags", e))?;
                tags = parse_tags(&value);
            }
            _ => {}
        }
    }

    let (data, filename, content_type) =
        file.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;
    if data.is_empty() {
        return Err(AppError::InvalidInput("Uploaded file is empty".to_string()));
    }

    Ok(UploadForm {
        data,
        filename: filename
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| "upload".to_string()),
        content_type,
        folder,
        tags,
    })
}

/// A body cut off by the request size limit surfaces as a multipart error
/// carrying 413.
fn multipart_error(context: &str, err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!(
            "Upload exceeds the request size limit: {}",
            err.body_text()
        ))
    } else {
        AppError::InvalidInput(format!("{}: {}", context, err.body_text()))
    }
}

/// Split a comma-separated tag list, trimming and dropping empties.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::status_of;
    use axum::{extract::DefaultBodyLimit, routing::post, Router};
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use vitrine_core::ErrorMetadata;

    async fn echo_form(multipart: Multipart) -> (StatusCode, String) {
        match extract_upload_form(multipart).await {
            Ok(form) => (StatusCode::OK, form.data.len().to_string()),
            Err(e) => (status_of(&e), e.client_message()),
        }
    }

    fn limited_server(limit: usize) -> TestServer {
        let router = Router::new()
            .route("/", post(echo_form))
            .layer(DefaultBodyLimit::max(limit));
        TestServer::new(router).unwrap()
    }

    #[tokio::test]
    async fn test_body_over_limit_is_payload_too_large() {
        let server = limited_server(1024);
        let part = Part::bytes(vec![7u8; 8 * 1024]).file_name("big.png");
        let response = server
            .post("/")
            .multipart(MultipartForm::new().add_part("file", part))
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert!(response.text().starts_with("Upload exceeds the request size limit"));
    }

    #[tokio::test]
    async fn test_body_under_limit_is_read() {
        let server = limited_server(64 * 1024);
        let part = Part::bytes(vec![7u8; 8 * 1024]).file_name("small.png");
        let response = server
            .post("/")
            .multipart(MultipartForm::new().add_part("file", part))
            .await;

        response.assert_status_ok();
        assert_eq!(response.text(), "8192");
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags(" hero, home ,,gallery"), vec!["hero", "home", "gallery"]);
        assert!(parse_tags(" , ").is_empty());
    }
}
