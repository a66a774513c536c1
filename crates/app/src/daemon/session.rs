//! In-memory session for two named parties
//!
//! Holds the current key pairs, the last exchange summary and the
//! performance log. Nothing here outlives the process except the files
//! written through the [`FileStore`].

use std::time::{Duration, Instant};

use common::crypto::{
    self, compute_shared_secret, derive_symmetric_key, verify_mutual_derivation, CipherError,
    CipherMode, Curve, DerivedKey, EncryptedPackage, ExchangeError, KeyError, KeyPair,
    MutualDerivation, DEFAULT_FILENAME,
};
use common::metrics::{MetricsSink, OperationMetrics};

use super::file_store::{FileStore, FileStoreError, KeyFiles};
use super::perf_log::PerformanceLog;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Keys not generated. Please generate keys first.")]
    KeysMissing,
    #[error("Key exchange not performed. Please perform key exchange first.")]
    ExchangeMissing,
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    #[error(transparent)]
    Cipher(#[from] CipherError),
    #[error(transparent)]
    Files(#[from] FileStoreError),
}

/// A generated key pair and where it was written
#[derive(Debug, Clone)]
pub struct GeneratedParty {
    pub name: String,
    pub public_key_pem: String,
    pub files: KeyFiles,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct KeyGeneration {
    pub curve: Curve,
    pub initiator: GeneratedParty,
    pub responder: GeneratedParty,
}

impl KeyGeneration {
    pub fn total(&self) -> Duration {
        self.initiator.elapsed + self.responder.elapsed
    }
}

#[derive(Debug, Clone)]
pub struct EncryptOutcome {
    pub original_filename: String,
    pub encrypted_filename: String,
    pub package: EncryptedPackage,
    pub original_size: usize,
    /// Length of the stored JSON package
    pub encrypted_size: usize,
    pub metrics: OperationMetrics,
}

impl EncryptOutcome {
    pub fn size_increase(&self) -> i64 {
        self.encrypted_size as i64 - self.original_size as i64
    }

    /// `None` for an empty payload, where a ratio is meaningless
    pub fn size_increase_percent(&self) -> Option<f64> {
        (self.original_size > 0)
            .then(|| self.size_increase() as f64 / self.original_size as f64 * 100.0)
    }
}

#[derive(Debug, Clone)]
pub struct DecryptOutcome {
    pub algorithm: &'static str,
    pub decrypted_filename: String,
    pub encrypted_size: usize,
    pub decrypted_size: usize,
    pub metrics: OperationMetrics,
}

struct PartyKeys {
    initiator: KeyPair,
    responder: KeyPair,
}

pub struct Session {
    initiator: String,
    responder: String,
    curve: Curve,
    keys: Option<PartyKeys>,
    exchange: Option<MutualDerivation>,
    performance: PerformanceLog,
}

impl Session {
    pub fn new(initiator: impl Into<String>, responder: impl Into<String>, curve: Curve) -> Self {
        Self {
            initiator: initiator.into(),
            responder: responder.into(),
            curve,
            keys: None,
            exchange: None,
            performance: PerformanceLog::default(),
        }
    }

    pub fn initiator(&self) -> &str {
        &self.initiator
    }

    pub fn responder(&self) -> &str {
        &self.responder
    }

    pub fn has_keys(&self) -> bool {
        self.keys.is_some()
    }

    pub fn exchange(&self) -> Option<&MutualDerivation> {
        self.exchange.as_ref()
    }

    pub fn performance(&self) -> &PerformanceLog {
        &self.performance
    }

    /// Replace both parties' key pairs, on `curve` or the session default
    ///
    /// Any previous exchange is discarded since it no longer matches the keys.
    pub fn generate_keys(
        &mut self,
        files: &FileStore,
        curve: Option<Curve>,
    ) -> Result<KeyGeneration, SessionError> {
        let curve = curve.unwrap_or(self.curve);
        files.remove_key_files(&[&self.initiator, &self.responder]);
        self.keys = None;
        self.exchange = None;

        let (initiator_pair, initiator) = generate_party(files, &self.initiator, curve)?;
        let (responder_pair, responder) = generate_party(files, &self.responder, curve)?;

        self.keys = Some(PartyKeys {
            initiator: initiator_pair,
            responder: responder_pair,
        });
        self.performance
            .record_key_generation(initiator.elapsed, responder.elapsed);

        tracing::info!(
            %curve,
            initiator = %self.initiator,
            responder = %self.responder,
            "generated session keys"
        );

        Ok(KeyGeneration {
            curve,
            initiator,
            responder,
        })
    }

    /// Run the exchange from both sides and remember the summary
    pub fn key_exchange(&mut self) -> Result<MutualDerivation, SessionError> {
        let keys = self.keys.as_ref().ok_or(SessionError::KeysMissing)?;

        let derivation = verify_mutual_derivation(
            keys.initiator.private_key(),
            keys.initiator.public_key(),
            keys.responder.private_key(),
            keys.responder.public_key(),
        )?;

        if !derivation.keys_match {
            tracing::warn!("mutual derivation produced different keys");
        }
        tracing::info!(
            keys_match = derivation.keys_match,
            secrets_match = derivation.secrets_match,
            "key exchange complete"
        );

        self.performance.record_key_exchange(&derivation);
        self.exchange = Some(derivation.clone());
        Ok(derivation)
    }

    /// Key the initiator seals with for the responder
    pub fn encryption_key(&self) -> Result<DerivedKey, SessionError> {
        let keys = self.exchanged_keys()?;
        session_key(&keys.initiator, &keys.responder)
    }

    /// Key the responder opens initiator packages with
    pub fn decryption_key(&self) -> Result<DerivedKey, SessionError> {
        let keys = self.exchanged_keys()?;
        session_key(&keys.responder, &keys.initiator)
    }

    pub fn record(&mut self, metrics: &OperationMetrics) {
        self.performance.record(metrics);
    }

    /// Seal `plaintext` from the initiator to the responder and store the package
    pub fn encrypt(
        &mut self,
        files: &FileStore,
        mode: CipherMode,
        plaintext: &[u8],
        filename: &str,
    ) -> Result<EncryptOutcome, SessionError> {
        let key = self.encryption_key()?;
        let outcome = seal_file(files, &key, mode, plaintext, filename)?;
        self.record(&outcome.metrics);
        Ok(outcome)
    }

    /// Open a JSON package as the responder and store the plaintext
    pub fn decrypt(
        &mut self,
        files: &FileStore,
        package_json: &[u8],
    ) -> Result<DecryptOutcome, SessionError> {
        let key = self.decryption_key()?;
        let outcome = open_file(files, &key, package_json)?;
        self.record(&outcome.metrics);
        Ok(outcome)
    }

    /// Forget keys, exchange and performance history, and empty the file store
    pub fn reset(&mut self, files: &FileStore) -> Result<usize, SessionError> {
        self.keys = None;
        self.exchange = None;
        self.performance.clear();
        let removed = files.clear_all()?;
        tracing::info!(removed, "session reset");
        Ok(removed)
    }

    fn exchanged_keys(&self) -> Result<&PartyKeys, SessionError> {
        let keys = self.keys.as_ref().ok_or(SessionError::KeysMissing)?;
        if self.exchange.is_none() {
            return Err(SessionError::ExchangeMissing);
        }
        Ok(keys)
    }
}

fn generate_party(
    files: &FileStore,
    name: &str,
    curve: Curve,
) -> Result<(KeyPair, GeneratedParty), SessionError> {
    let start = Instant::now();
    let pair = KeyPair::generate(curve);
    let elapsed = start.elapsed();

    let written = files.write_key_pair(name, &pair)?;
    let party = GeneratedParty {
        name: name.to_string(),
        public_key_pem: pair.export_public_key()?,
        files: written,
        elapsed,
    };
    Ok((pair, party))
}

/// Encrypt with an already derived key and write the package to the store
///
/// Touches no session state, so callers run it without holding the session lock.
pub fn seal_file(
    files: &FileStore,
    key: &DerivedKey,
    mode: CipherMode,
    plaintext: &[u8],
    filename: &str,
) -> Result<EncryptOutcome, SessionError> {
    let sealed = crypto::encrypt(key, mode, plaintext, filename)?;
    let json = sealed
        .package
        .to_json()
        .map_err(|e| SessionError::Cipher(e.into()))?;
    let encrypted_filename = files.write_encrypted(filename, json.as_bytes())?;

    tracing::info!(
        algorithm = mode.algorithm(),
        file = %encrypted_filename,
        bytes = plaintext.len(),
        "encrypted file"
    );

    Ok(EncryptOutcome {
        original_filename: filename.to_string(),
        encrypted_filename,
        package: sealed.package,
        original_size: plaintext.len(),
        encrypted_size: json.len(),
        metrics: sealed.metrics,
    })
}

/// Open a JSON package with an already derived key and write the plaintext
pub fn open_file(
    files: &FileStore,
    key: &DerivedKey,
    package_json: &[u8],
) -> Result<DecryptOutcome, SessionError> {
    let package =
        EncryptedPackage::from_json(package_json).map_err(|e| SessionError::Cipher(e.into()))?;
    let opened = crypto::decrypt(key, &package)?;

    let decrypted_filename = match files.write_upload(&opened.original_filename, &opened.plaintext)
    {
        Err(FileStoreError::InvalidName(_)) => {
            files.write_upload(DEFAULT_FILENAME, &opened.plaintext)?
        }
        other => other?,
    };

    tracing::info!(
        algorithm = package.algorithm(),
        file = %decrypted_filename,
        bytes = opened.plaintext.len(),
        "decrypted file"
    );

    Ok(DecryptOutcome {
        algorithm: package.algorithm(),
        decrypted_filename,
        encrypted_size: package_json.len(),
        decrypted_size: opened.plaintext.len(),
        metrics: opened.metrics,
    })
}

fn session_key(local: &KeyPair, peer: &KeyPair) -> Result<DerivedKey, SessionError> {
    let secret = compute_shared_secret(local.private_key(), peer.public_key())?;
    Ok(derive_symmetric_key(&secret)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (Session, FileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let files =
            FileStore::new(root.join("keys"), root.join("uploads"), root.join("encrypted")).unwrap();
        (Session::new("alice", "bob", Curve::P256), files, temp_dir)
    }

    #[test]
    fn test_operations_require_keys_then_exchange() {
        let (mut session, files, _temp) = setup();

        assert!(matches!(
            session.key_exchange(),
            Err(SessionError::KeysMissing)
        ));
        assert!(matches!(
            session.encrypt(&files, CipherMode::Gcm, b"x", "x.txt"),
            Err(SessionError::KeysMissing)
        ));

        session.generate_keys(&files, None).unwrap();
        assert!(matches!(
            session.encrypt(&files, CipherMode::Gcm, b"x", "x.txt"),
            Err(SessionError::ExchangeMissing)
        ));
        assert!(matches!(
            session.decrypt(&files, b"{}"),
            Err(SessionError::ExchangeMissing)
        ));
    }

    #[test]
    fn test_full_flow() {
        let (mut session, files, temp) = setup();

        let generated = session.generate_keys(&files, None).unwrap();
        assert_eq!(generated.initiator.files.private_file, "alice_private.pem");
        assert_eq!(generated.responder.files.public_file, "bob_public.pem");
        assert!(temp.path().join("keys/bob_private.pem").is_file());

        let exchange = session.key_exchange().unwrap();
        assert!(exchange.keys_match);

        for mode in [CipherMode::Gcm, CipherMode::Cbc] {
            let sealed = session
                .encrypt(&files, mode, b"hello test", "hello.txt")
                .unwrap();
            assert_eq!(sealed.encrypted_filename, "hello.txt.enc");
            assert!(sealed.size_increase() > 0);

            let json = std::fs::read(temp.path().join("encrypted/hello.txt.enc")).unwrap();
            let opened = session.decrypt(&files, &json).unwrap();
            assert_eq!(opened.decrypted_filename, "hello.txt");
            assert_eq!(opened.algorithm, mode.algorithm());

            let plaintext = std::fs::read(temp.path().join("uploads/hello.txt")).unwrap();
            assert_eq!(plaintext, b"hello test");
        }

        let stats = session.performance().statistics();
        assert_eq!(stats.key_generation_count, 1);
        assert_eq!(stats.key_exchange_count, 1);
        assert_eq!(stats.encryption_count, 2);
        assert_eq!(stats.decryption_count, 2);
    }

    #[test]
    fn test_regenerating_keys_drops_exchange() {
        let (mut session, files, _temp) = setup();
        session.generate_keys(&files, None).unwrap();
        session.key_exchange().unwrap();
        assert!(session.exchange().is_some());

        session.generate_keys(&files, Some(Curve::P384)).unwrap();
        assert!(session.exchange().is_none());
        assert!(session.has_keys());
    }

    #[test]
    fn test_empty_payload_has_no_increase_percent() {
        let (mut session, files, _temp) = setup();
        session.generate_keys(&files, None).unwrap();
        session.key_exchange().unwrap();

        let sealed = session
            .encrypt(&files, CipherMode::Cbc, b"", "empty.txt")
            .unwrap();
        assert_eq!(sealed.original_size, 0);
        assert_eq!(sealed.size_increase_percent(), None);
        assert_eq!(sealed.package.ciphertext().len(), 16);
    }

    #[test]
    fn test_unsafe_package_filename_falls_back() {
        let (mut session, files, temp) = setup();
        session.generate_keys(&files, None).unwrap();
        session.key_exchange().unwrap();

        let sealed = session
            .encrypt(&files, CipherMode::Gcm, b"data", "ok.txt")
            .unwrap();
        let mut value: serde_json::Value =
            serde_json::from_str(&sealed.package.to_json().unwrap()).unwrap();
        value["original_filename"] = "../..".into();

        let opened = session
            .decrypt(&files, value.to_string().as_bytes())
            .unwrap();
        assert_eq!(opened.decrypted_filename, DEFAULT_FILENAME);
        assert!(temp.path().join("uploads").join(DEFAULT_FILENAME).is_file());
    }

    #[test]
    fn test_sealing_does_not_need_the_session_lock() {
        let (session, files, temp) = setup();
        let session = std::sync::Arc::new(parking_lot::Mutex::new(session));
        session.lock().generate_keys(&files, None).unwrap();
        session.lock().key_exchange().unwrap();

        let seal_key = session.lock().encryption_key().unwrap();
        let open_key = session.lock().decryption_key().unwrap();

        // Another request owns the session while this one works
        let guard = session.lock();
        let worker_files = files.clone();
        let package_path = temp.path().join("encrypted/a.txt.enc");
        let worker = std::thread::spawn(move || {
            let sealed =
                seal_file(&worker_files, &seal_key, CipherMode::Cbc, b"hello test", "a.txt")?;
            let json = std::fs::read(package_path).unwrap();
            let opened = open_file(&worker_files, &open_key, &json)?;
            Ok::<_, SessionError>((sealed, opened))
        });
        let (sealed, opened) = worker.join().unwrap().unwrap();
        drop(guard);

        assert_eq!(opened.decrypted_filename, "a.txt");
        assert_eq!(
            std::fs::read(temp.path().join("uploads/a.txt")).unwrap(),
            b"hello test"
        );

        let mut session = session.lock();
        session.record(&sealed.metrics);
        session.record(&opened.metrics);
        let stats = session.performance().statistics();
        assert_eq!(stats.encryption_count, 1);
        assert_eq!(stats.decryption_count, 1);
    }

    #[test]
    fn test_reset() {
        let (mut session, files, _temp) = setup();
        session.generate_keys(&files, None).unwrap();
        session.key_exchange().unwrap();

        let removed = session.reset(&files).unwrap();
        assert_eq!(removed, 4);
        assert!(!session.has_keys());
        assert!(session.exchange().is_none());
        assert!(session.performance().entries().is_empty());
    }
}
