#![allow(dead_code)]

use axum::body::{to_bytes, Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use ::common::prelude::Curve;
use hybrid_ecc::http_server::api::client::ApiClient;
use hybrid_ecc::{http_server, ServiceConfig, ServiceState};

pub const BOUNDARY: &str = "hybrid-test-boundary";

/// A router over a fresh session whose files live in a temp dir
pub struct TestDaemon {
    pub router: Router,
    pub state: ServiceState,
    pub dir: TempDir,
}

pub fn setup() -> TestDaemon {
    setup_with_limit(16 * 1024 * 1024)
}

pub fn setup_with_limit(max_payload_bytes: usize) -> TestDaemon {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let config = ServiceConfig {
        api_port: 0,
        max_payload_bytes,
        initiator: "alice".to_string(),
        responder: "bob".to_string(),
        curve: Curve::P256,
        keys_dir: root.join("keys"),
        uploads_dir: root.join("uploads"),
        encrypted_dir: root.join("encrypted"),
        log_level: tracing::Level::DEBUG,
        log_dir: None,
    };
    let state = ServiceState::from_config(&config).unwrap();
    let router = http_server::router(state.clone());
    TestDaemon { router, state, dir }
}

/// Send a request and collect the full response body
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body)
}

pub async fn send_json(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(router, request).await;
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Multipart body with a `file` part and an optional `mode` part
pub fn multipart_body(filename: &str, data: &[u8], mode: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(mode) = mode {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"mode\"\r\n\r\n{mode}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn post_multipart(uri: &str, filename: &str, data: &[u8], mode: Option<&str>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(filename, data, mode)))
        .unwrap()
}

/// Generate keys and run the exchange
pub async fn prepare_session(router: &Router) {
    let (status, _) = send_json(router, post_json("/api/v0/keys", serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send_json(router, post_empty("/api/v0/exchange")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["keys_match"], true);
}

/// Encrypt `data` and download the stored package
pub async fn encrypt(router: &Router, filename: &str, data: &[u8], mode: &str) -> (Value, Bytes) {
    let (status, body) = send_json(
        router,
        post_multipart("/api/v0/encrypt", filename, data, Some(mode)),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "encrypt failed: {}", body);

    let name = body["encrypted_filename"].as_str().unwrap().to_string();
    let (status, package) = send(router, get(&format!("/api/v0/files/{}", name))).await;
    assert_eq!(status, StatusCode::OK);
    (body, package)
}

/// Serve the router on an ephemeral local port and return a client for it
pub async fn serve(router: Router) -> ApiClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    let remote = url::Url::parse(&format!("http://{}", addr)).unwrap();
    ApiClient::new(&remote).unwrap()
}
