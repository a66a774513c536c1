use std::path::PathBuf;

use clap::Args;

use common::prelude::Curve;
use hybrid_ecc::state::{AppConfig, AppState, DEFAULT_API_PORT, DEFAULT_MAX_PAYLOAD_BYTES};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// API server port
    #[arg(long, default_value_t = DEFAULT_API_PORT)]
    pub api_port: u16,

    /// Name of the party that encrypts
    #[arg(long, default_value = "alice")]
    pub initiator: String,

    /// Name of the party that decrypts
    #[arg(long, default_value = "bob")]
    pub responder: String,

    /// Curve for generated keys (P-256 or P-384)
    #[arg(long, default_value_t = Curve::P256)]
    pub curve: Curve,

    /// Largest accepted request body in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_PAYLOAD_BYTES)]
    pub max_payload_bytes: usize,

    /// Directory for daemon log files (stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] hybrid_ecc::state::StateError),
    #[error("initiator and responder must have different names")]
    SameParties,
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        if self.initiator == self.responder {
            return Err(InitError::SameParties);
        }

        let config = AppConfig {
            api_port: self.api_port,
            max_payload_bytes: self.max_payload_bytes,
            initiator: self.initiator.clone(),
            responder: self.responder.clone(),
            curve: self.curve,
            log_dir: self.log_dir.clone(),
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        let log_dir = match &state.config.log_dir {
            Some(dir) => dir.display().to_string(),
            None => "stdout only".to_string(),
        };

        let output = format!(
            "Initialized hybrid directory at: {}\n\
             - Keys: {}\n\
             - Uploads: {}\n\
             - Encrypted: {}\n\
             - Config: {}\n\
             - API port: {}\n\
             - Parties: {} -> {}\n\
             - Curve: {}\n\
             - Logs: {}",
            state.hybrid_dir.display(),
            state.keys_path.display(),
            state.uploads_path.display(),
            state.encrypted_path.display(),
            state.config_path.display(),
            state.config.api_port,
            state.config.initiator,
            state.config.responder,
            state.config.curve,
            log_dir
        );

        Ok(output)
    }
}
