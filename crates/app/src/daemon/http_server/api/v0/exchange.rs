use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::crypto::SideTiming;
use common::prelude::Curve;

use crate::daemon::session::SessionError;
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
pub struct ExchangeRequest {}

/// Seconds spent on one side of the exchange
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SideTimes {
    pub computation_time: f64,
    pub derivation_time: f64,
    pub total_time: f64,
}

impl From<SideTiming> for SideTimes {
    fn from(timing: SideTiming) -> Self {
        Self {
            computation_time: timing.compute.as_secs_f64(),
            derivation_time: timing.derive.as_secs_f64(),
            total_time: timing.total().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeResponse {
    pub success: bool,
    pub curve: Curve,
    pub keys_match: bool,
    pub shared_secrets_match: bool,
    /// Present only when both sides derived the same key
    pub key_fingerprint: Option<String>,
    pub initiator: SideTimes,
    pub responder: SideTimes,
    pub verification_time: f64,
}

pub async fn handler(State(state): State<ServiceState>) -> Result<impl IntoResponse, SessionError> {
    let derivation = state.session().key_exchange()?;

    Ok((
        http::StatusCode::OK,
        Json(ExchangeResponse {
            success: true,
            curve: derivation.curve,
            keys_match: derivation.keys_match,
            shared_secrets_match: derivation.secrets_match,
            verification_time: derivation.total().as_secs_f64(),
            key_fingerprint: derivation.fingerprint,
            initiator: derivation.initiator.into(),
            responder: derivation.responder.into(),
        }),
    )
        .into_response())
}

impl ApiRequest for ExchangeRequest {
    type Response = ExchangeResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/exchange").unwrap();
        client.post(full_url).json(&self)
    }
}
