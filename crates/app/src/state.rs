use std::{fs, path::PathBuf};

use common::prelude::Curve;
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "hybrid";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEYS_DIR_NAME: &str = "keys";
pub const UPLOADS_DIR_NAME: &str = "uploads";
pub const ENCRYPTED_DIR_NAME: &str = "encrypted";
pub const LOGS_DIR_NAME: &str = "logs";

/// Default API port
pub const DEFAULT_API_PORT: u16 = 5002;
/// Largest accepted request body (16 MiB)
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the API server
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Request body limit in bytes
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
    /// Name of the party that seals payloads
    #[serde(default = "default_initiator")]
    pub initiator: String,
    /// Name of the party that opens them
    #[serde(default = "default_responder")]
    pub responder: String,
    /// Curve used for key generation
    #[serde(default)]
    pub curve: Curve,
    /// Directory for log files (stdout only if not set)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_api_port() -> u16 {
    DEFAULT_API_PORT
}

fn default_max_payload_bytes() -> usize {
    DEFAULT_MAX_PAYLOAD_BYTES
}

fn default_initiator() -> String {
    "alice".to_string()
}

fn default_responder() -> String {
    "bob".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            max_payload_bytes: default_max_payload_bytes(),
            initiator: default_initiator(),
            responder: default_responder(),
            curve: Curve::default(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the hybrid directory (~/.hybrid)
    pub hybrid_dir: PathBuf,
    /// Where PEM key files are written
    pub keys_path: PathBuf,
    /// Where decrypted payloads are written
    pub uploads_path: PathBuf,
    /// Where encrypted packages are written
    pub encrypted_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the hybrid directory path (custom or default ~/.hybrid)
    pub fn hybrid_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new hybrid state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let hybrid_dir = Self::hybrid_dir(custom_path)?;

        if hybrid_dir.join(CONFIG_FILE_NAME).exists() {
            return Err(StateError::AlreadyInitialized);
        }

        let state = Self::layout(hybrid_dir, config.unwrap_or_default());
        for dir in state.data_dirs() {
            fs::create_dir_all(dir)?;
        }
        if let Some(log_dir) = &state.config.log_dir {
            fs::create_dir_all(log_dir)?;
        }

        let config_toml = toml::to_string_pretty(&state.config)?;
        fs::write(&state.config_path, config_toml)?;

        Ok(state)
    }

    /// Load existing state from the hybrid directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let hybrid_dir = Self::hybrid_dir(custom_path)?;

        if !hybrid_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = hybrid_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        if config.initiator == config.responder {
            return Err(StateError::InvalidConfig(
                "initiator and responder must have different names".to_string(),
            ));
        }

        let state = Self::layout(hybrid_dir, config);

        // Data directories are recreated rather than required; reset empties them
        for dir in state.data_dirs() {
            fs::create_dir_all(dir)?;
        }

        Ok(state)
    }

    fn layout(hybrid_dir: PathBuf, config: AppConfig) -> Self {
        Self {
            keys_path: hybrid_dir.join(KEYS_DIR_NAME),
            uploads_path: hybrid_dir.join(UPLOADS_DIR_NAME),
            encrypted_path: hybrid_dir.join(ENCRYPTED_DIR_NAME),
            config_path: hybrid_dir.join(CONFIG_FILE_NAME),
            hybrid_dir,
            config,
        }
    }

    fn data_dirs(&self) -> [&PathBuf; 3] {
        [&self.keys_path, &self.uploads_path, &self.encrypted_path]
    }

    /// Default log directory inside the hybrid directory
    pub fn default_log_dir(&self) -> PathBuf {
        self.hybrid_dir.join(LOGS_DIR_NAME)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("hybrid directory not initialized. Run 'hybrid init' first")]
    NotInitialized,

    #[error("hybrid directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
