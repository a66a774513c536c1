use axum::extract::{Path, State};
use axum::response::IntoResponse;

use crate::daemon::file_store::FileStoreError;
use crate::daemon::session::SessionError;
use crate::ServiceState;

/// Route path for a stored file, relative to the daemon root
pub fn download_path(name: &str) -> String {
    format!("/api/v0/files/{}", name)
}

/// Serve a decrypted payload or encrypted package as an attachment
pub async fn handler(
    State(state): State<ServiceState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, SessionError> {
    let path = state.files().locate(&name)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.clone());

    let content = tokio::fs::read(&path).await.map_err(FileStoreError::from)?;
    let mime_type = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .to_string();

    tracing::debug!(file = %filename, bytes = content.len(), "serving file");

    Ok((
        http::StatusCode::OK,
        [
            (axum::http::header::CONTENT_TYPE, mime_type),
            (
                axum::http::header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        content,
    )
        .into_response())
}
