//! `/api` surface: versioned routes behind a CORS policy that admits any origin

use axum::Router;
use http::header::{ACCEPT, CONTENT_TYPE, ORIGIN};
use tower_http::cors::{Any, CorsLayer};

pub mod client;
pub mod v0;

use crate::ServiceState;

/// Uploads come from browsers on any origin, never with credentials
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_methods(v0::ROUTE_METHODS.to_vec())
        .allow_headers(vec![ACCEPT, CONTENT_TYPE, ORIGIN])
        .allow_origin(Any)
        .allow_credentials(false)
}

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/v0", v0::router(state.clone()))
        .with_state(state)
        .layer(cors_layer())
}
