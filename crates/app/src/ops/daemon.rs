use clap::Args;

use hybrid_ecc::state::AppState;
use hybrid_ecc::{spawn_service, ServiceConfig};

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override the configured API port
    #[arg(long)]
    pub api_port: Option<u16>,

    /// Log at debug level instead of info
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] hybrid_ecc::state::StateError),
}

#[async_trait::async_trait]
impl crate::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        // Load state from config path (or default ~/.hybrid)
        let state = AppState::load(ctx.config_path.clone())?;

        let log_level = if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        };

        let mut config = ServiceConfig::from_app_state(&state, log_level);
        if let Some(port) = self.api_port {
            config.api_port = port;
        }

        spawn_service(&config).await;
        Ok("daemon ended".to_string())
    }
}
