use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::response::{IntoResponse, Response};
use http::StatusCode;

use crate::daemon::file_store::secure_filename;
use crate::daemon::session::SessionError;

use super::error_response;

/// A single uploaded file plus the optional cipher mode field
#[derive(Debug)]
pub(crate) struct Upload {
    pub filename: String,
    pub data: Vec<u8>,
    pub mode: Option<String>,
}

/// Read the `file` and `mode` fields of a multipart body
pub(crate) async fn read_upload(multipart: &mut Multipart) -> Result<Upload, UploadError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut mode: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await?.to_vec();
                tracing::debug!(file = %filename, bytes = data.len(), "read upload");
                file = Some((filename, data));
            }
            "mode" => {
                mode = Some(field.text().await?);
            }
            _ => {
                tracing::warn!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let (raw_name, data) =
        file.ok_or_else(|| UploadError::InvalidRequest("No file provided".into()))?;
    let filename = secure_filename(&raw_name)
        .ok_or_else(|| UploadError::InvalidRequest("No file selected".into()))?;

    Ok(Upload {
        filename,
        data,
        mode,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        match self {
            UploadError::InvalidRequest(msg) => error_response(StatusCode::BAD_REQUEST, msg),
            UploadError::Multipart(e) => {
                let status = e.status();
                if status == StatusCode::PAYLOAD_TOO_LARGE {
                    tracing::warn!("rejected oversized upload");
                    error_response(status, "payload too large")
                } else {
                    error_response(status, e.body_text())
                }
            }
            UploadError::Session(e) => e.into_response(),
            UploadError::Worker(e) => {
                tracing::error!("request failed: {}", e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "unexpected server error")
            }
        }
    }
}
