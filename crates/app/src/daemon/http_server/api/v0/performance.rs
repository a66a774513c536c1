use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::daemon::perf_log::{PerformanceEntry, Statistics};
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
pub struct PerformanceRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceResponse {
    pub success: bool,
    pub logs: Vec<PerformanceEntry>,
    pub statistics: Statistics,
}

pub async fn handler(State(state): State<ServiceState>) -> impl IntoResponse {
    let (logs, statistics) = {
        let session = state.session();
        let log = session.performance();
        (log.entries().to_vec(), log.statistics())
    };

    (
        http::StatusCode::OK,
        Json(PerformanceResponse {
            success: true,
            logs,
            statistics,
        }),
    )
}

impl ApiRequest for PerformanceRequest {
    type Response = PerformanceResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/performance").unwrap();
        client.get(full_url)
    }
}
