use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to read multipart: {0}")]
    Multipart(#[from] MultipartError),
    #[error("No file provided")]
    MissingFile,
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Reads the `file` field of an upload form; other fields are ignored.
pub async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, UploadError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            let file_name = field.file_name().unwrap_or("unknown").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field.bytes().await?;

            tracing::info!(
                "Received upload {} ({}, {} bytes)",
                file_name,
                content_type,
                data.len()
            );

            upload = Some(UploadedFile {
                file_name,
                content_type,
                data,
            });
        }
    }

    upload.ok_or(UploadError::MissingFile)
}
