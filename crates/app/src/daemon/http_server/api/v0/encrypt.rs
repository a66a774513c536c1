use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::multipart;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::{CipherMode, EncryptedPackage};

use super::upload::{read_upload, UploadError};
use crate::daemon::session::seal_file;
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

/// Client side of `POST /api/v0/encrypt`
#[derive(Debug, Clone)]
pub struct EncryptRequest {
    pub filename: String,
    pub data: Vec<u8>,
    pub mode: CipherMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptResponse {
    pub success: bool,
    pub original_filename: String,
    pub encrypted_filename: String,
    pub algorithm: String,
    pub encryption_time: f64,
    pub original_size: usize,
    pub encrypted_size: usize,
    pub size_increase: i64,
    /// Null for an empty upload
    pub size_increase_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv: Option<String>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, UploadError> {
    let upload = read_upload(&mut multipart).await?;
    let mode = match upload.mode.as_deref() {
        None | Some("") => CipherMode::default(),
        Some(raw) => raw
            .parse::<CipherMode>()
            .map_err(|_| UploadError::InvalidRequest(format!("Invalid mode: {}", raw)))?,
    };

    // Hold the session only long enough to derive the key and to log the result
    let key = state.session().encryption_key()?;
    let files = state.shared_files();
    let outcome = tokio::task::spawn_blocking(move || {
        seal_file(&files, &key, mode, &upload.data, &upload.filename)
    })
    .await??;
    state.session().record(&outcome.metrics);

    let (nonce, tag, iv) = match &outcome.package {
        EncryptedPackage::Gcm(p) => (
            Some(BASE64.encode(&p.nonce)),
            Some(BASE64.encode(&p.tag)),
            None,
        ),
        EncryptedPackage::Cbc(p) => (None, None, Some(BASE64.encode(&p.iv))),
    };

    Ok((
        http::StatusCode::OK,
        Json(EncryptResponse {
            success: true,
            size_increase: outcome.size_increase(),
            size_increase_percent: outcome.size_increase_percent(),
            encryption_time: outcome.metrics.elapsed_secs(),
            algorithm: outcome.package.algorithm().to_string(),
            original_filename: outcome.original_filename,
            encrypted_filename: outcome.encrypted_filename,
            original_size: outcome.original_size,
            encrypted_size: outcome.encrypted_size,
            nonce,
            tag,
            iv,
        }),
    )
        .into_response())
}

impl ApiRequest for EncryptRequest {
    type Response = EncryptResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/encrypt").unwrap();
        let form = multipart::Form::new()
            .text("mode", self.mode.to_string())
            .part("file", multipart::Part::bytes(self.data).file_name(self.filename));
        client.post(full_url).multipart(form)
    }
}
