use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::{Method, StatusCode};

use common::crypto::INTEGRITY_FAILURE;

pub mod decrypt;
pub mod download;
pub mod encrypt;
pub mod exchange;
pub mod keys;
pub mod performance;
pub mod reset;
mod upload;

pub use decrypt::{DecryptRequest, DecryptResponse};
pub use encrypt::{EncryptRequest, EncryptResponse};
pub use exchange::{ExchangeRequest, ExchangeResponse};
pub use keys::{KeysRequest, KeysResponse};
pub use performance::{PerformanceRequest, PerformanceResponse};
pub use reset::{ResetRequest, ResetResponse};

use crate::daemon::file_store::FileStoreError;
use crate::daemon::session::SessionError;
use crate::ServiceState;

/// Every method a v0 route answers to
pub const ROUTE_METHODS: [Method; 2] = [Method::GET, Method::POST];

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/keys", post(keys::handler))
        .route("/exchange", post(exchange::handler))
        .route("/encrypt", post(encrypt::handler))
        .route("/decrypt", post(decrypt::handler))
        .route("/files/:name", get(download::handler))
        .route("/performance", get(performance::handler))
        .route("/reset", post(reset::handler))
        .with_state(state)
}

/// JSON error body shared by every v0 endpoint
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({
        "success": false,
        "error": message.into(),
    });
    (status, Json(body)).into_response()
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        match &self {
            SessionError::KeysMissing | SessionError::ExchangeMissing => {
                error_response(StatusCode::CONFLICT, self.to_string())
            }
            SessionError::Cipher(e) if e.is_integrity_failure() => {
                tracing::warn!("rejected package: {}", e);
                error_response(StatusCode::UNPROCESSABLE_ENTITY, INTEGRITY_FAILURE)
            }
            SessionError::Cipher(common::crypto::CipherError::Package(e)) => {
                error_response(StatusCode::BAD_REQUEST, e.to_string())
            }
            SessionError::Files(FileStoreError::InvalidName(_)) => {
                error_response(StatusCode::BAD_REQUEST, self.to_string())
            }
            SessionError::Files(FileStoreError::NotFound(_)) => {
                error_response(StatusCode::NOT_FOUND, self.to_string())
            }
            _ => {
                tracing::error!("request failed: {}", self);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "unexpected server error")
            }
        }
    }
}
