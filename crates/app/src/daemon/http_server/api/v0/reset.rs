use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::daemon::session::SessionError;
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
pub struct ResetRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub success: bool,
    pub message: String,
    pub files_removed: usize,
}

pub async fn handler(State(state): State<ServiceState>) -> Result<impl IntoResponse, SessionError> {
    let files_removed = state.session().reset(state.files())?;

    Ok((
        http::StatusCode::OK,
        Json(ResetResponse {
            success: true,
            message: "Session reset successfully".to_string(),
            files_removed,
        }),
    )
        .into_response())
}

impl ApiRequest for ResetRequest {
    type Response = ResetResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/reset").unwrap();
        client.post(full_url).json(&self)
    }
}
