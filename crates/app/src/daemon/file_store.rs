use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use common::prelude::KeyPair;

/// Suffix given to encrypted packages
pub const ENCRYPTED_SUFFIX: &str = ".enc";

#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    #[error("invalid file name: {0:?}")]
    InvalidName(String),
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("failed to encode key: {0}")]
    Key(#[from] common::prelude::KeyError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reduce an untrusted file name to a safe basename
///
/// Keeps only the final path component, turns whitespace runs into `_`,
/// drops anything outside `[A-Za-z0-9._-]` and strips leading and trailing
/// dots and underscores. Returns `None` when nothing usable is left.
pub fn secure_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let joined = base.split_whitespace().collect::<Vec<_>>().join("_");
    let filtered: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let trimmed = filtered.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Names of the two PEM files written for one party
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFiles {
    pub private_file: String,
    pub public_file: String,
}

impl KeyFiles {
    pub fn for_party(party: &str) -> Self {
        Self {
            private_file: format!("{}_private.pem", party),
            public_file: format!("{}_public.pem", party),
        }
    }
}

/// On-disk home for key files, decrypted payloads and encrypted packages
#[derive(Debug, Clone)]
pub struct FileStore {
    keys_dir: PathBuf,
    uploads_dir: PathBuf,
    encrypted_dir: PathBuf,
}

impl FileStore {
    pub fn new(
        keys_dir: impl Into<PathBuf>,
        uploads_dir: impl Into<PathBuf>,
        encrypted_dir: impl Into<PathBuf>,
    ) -> Result<Self, FileStoreError> {
        let store = Self {
            keys_dir: keys_dir.into(),
            uploads_dir: uploads_dir.into(),
            encrypted_dir: encrypted_dir.into(),
        };
        for dir in store.dirs() {
            fs::create_dir_all(dir)?;
        }
        Ok(store)
    }

    fn dirs(&self) -> [&Path; 3] {
        [&self.keys_dir, &self.uploads_dir, &self.encrypted_dir]
    }

    pub fn keys_dir(&self) -> &Path {
        &self.keys_dir
    }

    /// Write a party's key pair as `{party}_private.pem` / `{party}_public.pem`
    pub fn write_key_pair(&self, party: &str, pair: &KeyPair) -> Result<KeyFiles, FileStoreError> {
        let files = KeyFiles::for_party(party);

        let private_pem = pair.export_private_key()?;
        write_private(&self.keys_dir.join(&files.private_file), private_pem.as_bytes())?;
        fs::write(
            self.keys_dir.join(&files.public_file),
            pair.export_public_key()?,
        )?;

        tracing::debug!(party, dir = %self.keys_dir.display(), "wrote key files");
        Ok(files)
    }

    /// Best-effort removal of the key files for `parties`
    pub fn remove_key_files(&self, parties: &[&str]) {
        for party in parties {
            let files = KeyFiles::for_party(party);
            for name in [files.private_file, files.public_file] {
                let path = self.keys_dir.join(&name);
                match fs::remove_file(&path) {
                    Ok(()) => tracing::debug!(file = %name, "removed old key file"),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => tracing::warn!(file = %name, error = %e, "failed to remove key file"),
                }
            }
        }
    }

    /// Store an encrypted package; returns the stored file name
    pub fn write_encrypted(&self, name: &str, contents: &[u8]) -> Result<String, FileStoreError> {
        let name = secure_filename(&format!("{}{}", name, ENCRYPTED_SUFFIX))
            .ok_or_else(|| FileStoreError::InvalidName(name.to_string()))?;
        fs::write(self.encrypted_dir.join(&name), contents)?;
        Ok(name)
    }

    /// Store a decrypted payload; returns the stored file name
    pub fn write_upload(&self, name: &str, contents: &[u8]) -> Result<String, FileStoreError> {
        let name =
            secure_filename(name).ok_or_else(|| FileStoreError::InvalidName(name.to_string()))?;
        fs::write(self.uploads_dir.join(&name), contents)?;
        Ok(name)
    }

    /// Find a stored file, looking in uploads before encrypted packages
    pub fn locate(&self, name: &str) -> Result<PathBuf, FileStoreError> {
        let safe =
            secure_filename(name).ok_or_else(|| FileStoreError::InvalidName(name.to_string()))?;

        [&self.uploads_dir, &self.encrypted_dir]
            .into_iter()
            .map(|dir| dir.join(&safe))
            .find(|path| path.is_file())
            .ok_or(FileStoreError::NotFound(safe))
    }

    /// Delete every regular file in the keys, uploads and encrypted dirs
    pub fn clear_all(&self) -> Result<usize, FileStoreError> {
        let mut removed = 0;
        for dir in self.dirs() {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if !path.is_file() {
                    continue;
                }
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "failed to remove file")
                    }
                }
            }
        }
        Ok(removed)
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(contents)
}
