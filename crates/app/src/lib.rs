// Library exports shared by the `hybrid` binary and integration tests

// Daemon/service modules (session, file store, HTTP API)
pub mod daemon;
// On-disk state directory and config
pub mod state;

// Re-export key types for convenience
pub use daemon::http_server;
pub use daemon::ServiceConfig;
pub use daemon::ServiceState;
pub use daemon::{spawn_service, start_service};
pub use state::{AppConfig, AppState, StateError};
