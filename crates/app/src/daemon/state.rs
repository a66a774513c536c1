use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::config::Config;
use super::file_store::{FileStore, FileStoreError};
use super::session::Session;

/// Main service state, shared by every request handler
#[derive(Clone)]
pub struct State {
    session: Arc<Mutex<Session>>,
    files: Arc<FileStore>,
    max_payload_bytes: usize,
}

impl State {
    pub fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        if config.initiator == config.responder {
            return Err(StateSetupError::InvalidParties(config.initiator.clone()));
        }

        let files = FileStore::new(
            &config.keys_dir,
            &config.uploads_dir,
            &config.encrypted_dir,
        )?;
        tracing::info!(
            keys = %config.keys_dir.display(),
            uploads = %config.uploads_dir.display(),
            encrypted = %config.encrypted_dir.display(),
            "file store ready"
        );

        let session = Session::new(&config.initiator, &config.responder, config.curve);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            files: Arc::new(files),
            max_payload_bytes: config.max_payload_bytes,
        })
    }

    /// Lock the session; never hold the guard across an `.await`
    pub fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock()
    }

    pub fn files(&self) -> &FileStore {
        &self.files
    }

    /// Owned handle for work moved off the async runtime
    pub fn shared_files(&self) -> Arc<FileStore> {
        self.files.clone()
    }

    pub fn max_payload_bytes(&self) -> usize {
        self.max_payload_bytes
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("initiator and responder are both named {0:?}")]
    InvalidParties(String),
    #[error("file store error: {0}")]
    FileStore(#[from] FileStoreError),
}
