use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use reqwest::multipart;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use super::upload::{read_upload, UploadError};
use crate::daemon::session::open_file;
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

/// Client side of `POST /api/v0/decrypt`; `data` is the JSON package
#[derive(Debug, Clone)]
pub struct DecryptRequest {
    pub filename: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptResponse {
    pub success: bool,
    pub original_encrypted_filename: String,
    pub decrypted_filename: String,
    pub algorithm: String,
    pub decryption_time: f64,
    pub original_encrypted_size: usize,
    pub decrypted_size: usize,
}

pub async fn handler(
    State(state): State<ServiceState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, UploadError> {
    // The package's algorithm field picks the cipher; any mode field is ignored
    let upload = read_upload(&mut multipart).await?;

    let key = state.session().decryption_key()?;
    let files = state.shared_files();
    let package = upload.data;
    let outcome = tokio::task::spawn_blocking(move || open_file(&files, &key, &package)).await??;
    state.session().record(&outcome.metrics);

    Ok((
        http::StatusCode::OK,
        Json(DecryptResponse {
            success: true,
            original_encrypted_filename: upload.filename,
            decrypted_filename: outcome.decrypted_filename,
            algorithm: outcome.algorithm.to_string(),
            decryption_time: outcome.metrics.elapsed_secs(),
            original_encrypted_size: outcome.encrypted_size,
            decrypted_size: outcome.decrypted_size,
        }),
    )
        .into_response())
}

impl ApiRequest for DecryptRequest {
    type Response = DecryptResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/decrypt").unwrap();
        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(self.data).file_name(self.filename));
        client.post(full_url).multipart(form)
    }
}
