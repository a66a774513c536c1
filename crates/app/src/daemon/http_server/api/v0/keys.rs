use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::Curve;

use crate::daemon::session::{GeneratedParty, SessionError};
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
pub struct KeysRequest {
    /// Curve to generate on (P-256 or P-384); defaults to the daemon's configured curve
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub curve: Option<Curve>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyKeyInfo {
    pub name: String,
    pub public_key: String,
    pub private_file: String,
    pub public_file: String,
    /// Seconds
    pub generation_time: f64,
}

impl From<GeneratedParty> for PartyKeyInfo {
    fn from(party: GeneratedParty) -> Self {
        Self {
            name: party.name,
            public_key: party.public_key_pem,
            private_file: party.files.private_file,
            public_file: party.files.public_file,
            generation_time: party.elapsed.as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysResponse {
    pub success: bool,
    pub curve: Curve,
    pub initiator: PartyKeyInfo,
    pub responder: PartyKeyInfo,
    pub total_generation_time: f64,
}

/// The body is optional; an empty POST generates on the configured curve
pub async fn handler(
    State(state): State<ServiceState>,
    payload: Option<Json<KeysRequest>>,
) -> Result<impl IntoResponse, SessionError> {
    let curve = payload.and_then(|Json(req)| req.curve);

    let generated = state.session().generate_keys(state.files(), curve)?;
    let total_generation_time = generated.total().as_secs_f64();

    Ok((
        http::StatusCode::OK,
        Json(KeysResponse {
            success: true,
            curve: generated.curve,
            initiator: generated.initiator.into(),
            responder: generated.responder.into(),
            total_generation_time,
        }),
    )
        .into_response())
}

impl ApiRequest for KeysRequest {
    type Response = KeysResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/keys").unwrap();
        client.post(full_url).json(&self)
    }
}
