use std::path::PathBuf;

use common::prelude::Curve;

use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    /// Port for the API server
    pub api_port: u16,
    /// Largest request body accepted, in bytes
    pub max_payload_bytes: usize,

    // session configuration
    /// Party that seals payloads
    pub initiator: String,
    /// Party that opens them
    pub responder: String,
    /// Curve used when a key request does not name one
    pub curve: Curve,

    // file store configuration
    pub keys_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub encrypted_dir: PathBuf,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Service configuration for an initialized state directory
    pub fn from_app_state(state: &AppState, log_level: tracing::Level) -> Self {
        Self {
            api_port: state.config.api_port,
            max_payload_bytes: state.config.max_payload_bytes,
            initiator: state.config.initiator.clone(),
            responder: state.config.responder.clone(),
            curve: state.config.curve,
            keys_dir: state.keys_path.clone(),
            uploads_dir: state.uploads_path.clone(),
            encrypted_dir: state.encrypted_path.clone(),
            log_level,
            log_dir: state.config.log_dir.clone(),
        }
    }
}
