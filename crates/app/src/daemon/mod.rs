mod config;
pub mod file_store;
pub mod http_server;
pub mod perf_log;
pub mod process;
pub mod session;
mod state;

pub use config::Config as ServiceConfig;
pub use process::{spawn_service, start_service};
pub use state::{State as ServiceState, StateSetupError};
