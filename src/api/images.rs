//! Image upload and retrieval under `/image`

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::path::Path;
use tracing::{error, info, warn};

use crate::api::http::ApiClient;
use crate::errors::{ClientError, Result};
use crate::types::{ImageUploadResponse, MessageResponse};

/// Image calls
#[derive(Debug, Clone)]
pub struct ImageService {
    api: ApiClient,
}

impl ImageService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `POST /image/upload` as multipart (`file`, `relativePath`)
    ///
    /// Backend rejections come back as `Ok` with `success == false`; only
    /// local and transport failures are errors.
    pub async fn upload_image(
        &self,
        file: &Path,
        relative_path: &str,
    ) -> Result<ImageUploadResponse> {
        let data = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        self.upload_bytes(data, &file_name, relative_path).await
    }

    /// Upload an in-memory image
    pub async fn upload_bytes(
        &self,
        data: Vec<u8>,
        file_name: &str,
        relative_path: &str,
    ) -> Result<ImageUploadResponse> {
        let part = Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(guess_content_type(file_name))?;
        let form = Form::new()
            .part("file", part)
            .text("relativePath", relative_path.to_string());

        let url = self.api.url(&["image", "upload"])?;
        let response = match self.api.send(self.api.post(url).multipart(form)).await {
            Ok(r) => r,
            Err(ClientError::Request(e)) => {
                error!("Failed to upload image: {}", e);
                return Ok(ImageUploadResponse::failed(e.to_string()));
            }
            Err(e) => return Err(e),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = upload_failure_message(status, &body);
            error!("Failed to upload image: {}", message);
            return Ok(ImageUploadResponse::failed(message));
        }

        let result: ImageUploadResponse = response.json().await?;
        info!(file = %file_name, success = result.success, "image upload finished");
        Ok(result)
    }

    /// `GET /image/{relative path}`; `None` when the backend has no such image
    pub async fn get_image(&self, relative_path: &str) -> Result<Option<Bytes>> {
        let segments: Vec<&str> = relative_path
            .trim_start_matches('/')
            .split('/')
            .collect();
        let mut path = vec!["image"];
        path.extend(segments);
        let url = self.api.url(&path)?;

        let response = self.api.send(self.api.get(url)).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!("Image not found: {}", relative_path);
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                format!(
                    "Failed to fetch image {} with status: {}",
                    relative_path,
                    status.as_u16()
                )
            } else {
                body
            };
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(Some(response.bytes().await?))
    }
}

/// Browser-relative URL the backend serves an image at
pub fn image_url(relative_path: &str) -> String {
    format!("/image/{}", relative_path.strip_prefix('/').unwrap_or(relative_path))
}

fn upload_failure_message(status: StatusCode, body: &str) -> String {
    MessageResponse::from_body(body)
        .unwrap_or_else(|| format!("Image upload failed with status: {}", status.as_u16()))
}

fn guess_content_type(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url_strips_one_leading_slash() {
        assert_eq!(image_url("/2024/a.png"), "/image/2024/a.png");
        assert_eq!(image_url("2024/a.png"), "/image/2024/a.png");
    }

    #[test]
    fn test_upload_failure_message() {
        assert_eq!(
            upload_failure_message(StatusCode::INTERNAL_SERVER_ERROR, r#"{"message":"disk full"}"#),
            "disk full"
        );
        assert_eq!(
            upload_failure_message(StatusCode::BAD_GATEWAY, "<html>proxy</html>"),
            "Image upload failed with status: 502"
        );
        assert_eq!(
            upload_failure_message(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"disk"}"#),
            "Image upload failed with status: 500"
        );
        assert_eq!(
            upload_failure_message(StatusCode::BAD_REQUEST, r#"{"message":""}"#),
            "Image upload failed with status: 400"
        );
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("A.PNG"), "image/png");
        assert_eq!(guess_content_type("photo.jpeg"), "image/jpeg");
        assert_eq!(guess_content_type("notes"), "application/octet-stream");
    }
}
