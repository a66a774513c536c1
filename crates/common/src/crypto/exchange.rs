//! Elliptic-curve Diffie-Hellman between two parties
//!
//! Each side combines its own private key with the peer's public key. Both
//! sides arrive at the same raw secret, which is then fed to
//! [`derive_symmetric_key`](super::kdf::derive_symmetric_key).

use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::kdf::{derive_symmetric_key, DerivedKey};
use super::keys::{Curve, KeyError, Point, PrivateKey, PublicKey, Scalar};

/// Number of hex characters kept from the SHA-256 of a derived key
pub const FINGERPRINT_HEX_LEN: usize = 16;

/// Errors that can occur during key agreement and derivation
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("curve mismatch: local key is on {local}, peer key is on {peer}")]
    CurveMismatch { local: Curve, peer: Curve },
    #[error("invalid peer public key: {0}")]
    InvalidPoint(String),
    #[error("key derivation failed: {0}")]
    Derivation(String),
}

impl From<KeyError> for ExchangeError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::InvalidPoint(reason) | KeyError::Format(reason) => {
                ExchangeError::InvalidPoint(reason)
            }
        }
    }
}

/// Raw ECDH output (the x-coordinate of the shared point)
///
/// Never cloned, printed or persisted; zeroized when dropped.
pub struct SharedSecret(Zeroizing<Vec<u8>>);

impl SharedSecret {
    pub(crate) fn from_raw(bytes: &[u8]) -> Self {
        Self(Zeroizing::new(bytes.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for SharedSecret {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice().ct_eq(other.0.as_slice()).into()
    }
}

impl Eq for SharedSecret {}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedSecret({} bytes)", self.0.len())
    }
}

/// Compute the ECDH shared secret between `local` and `peer`
///
/// # Errors
///
/// Returns [`ExchangeError::CurveMismatch`] if the keys live on different
/// curves.
pub fn compute_shared_secret(
    local: &PrivateKey,
    peer: &PublicKey,
) -> Result<SharedSecret, ExchangeError> {
    let secret = match (&local.0, &peer.0) {
        (Scalar::P256(secret), Point::P256(public)) => {
            let shared = p256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
            SharedSecret::from_raw(shared.raw_secret_bytes().as_slice())
        }
        (Scalar::P384(secret), Point::P384(public)) => {
            let shared = p384::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
            SharedSecret::from_raw(shared.raw_secret_bytes().as_slice())
        }
        _ => {
            return Err(ExchangeError::CurveMismatch {
                local: local.curve(),
                peer: peer.curve(),
            })
        }
    };

    tracing::debug!(curve = %local.curve(), bytes = secret.len(), "computed shared secret");
    Ok(secret)
}

/// Compute the shared secret against a peer key received as raw SEC1 bytes
///
/// The bytes are interpreted on the local key's curve and validated before
/// use; the identity and off-curve points are rejected.
pub fn compute_shared_secret_sec1(
    local: &PrivateKey,
    peer_sec1: &[u8],
) -> Result<SharedSecret, ExchangeError> {
    let peer = PublicKey::from_sec1_bytes(local.curve(), peer_sec1)?;
    compute_shared_secret(local, &peer)
}

/// Timings for one side of a mutual derivation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SideTiming {
    pub compute: Duration,
    pub derive: Duration,
}

impl SideTiming {
    pub fn total(&self) -> Duration {
        self.compute + self.derive
    }
}

/// Outcome of running both sides of an exchange locally
#[derive(Debug, Clone, PartialEq)]
pub struct MutualDerivation {
    pub curve: Curve,
    pub secrets_match: bool,
    pub keys_match: bool,
    pub initiator: SideTiming,
    pub responder: SideTiming,
    /// Truncated SHA-256 of the derived key, set only when both keys agree
    pub fingerprint: Option<String>,
}

impl MutualDerivation {
    pub fn total(&self) -> Duration {
        self.initiator.total() + self.responder.total()
    }
}

/// Run the exchange from both sides and compare the results
///
/// A diagnostic: it proves both parties land on the same symmetric key
/// without ever handing the key bytes back to the caller.
pub fn verify_mutual_derivation(
    initiator_private: &PrivateKey,
    initiator_public: &PublicKey,
    responder_private: &PrivateKey,
    responder_public: &PublicKey,
) -> Result<MutualDerivation, ExchangeError> {
    let (initiator_secret, initiator_key, initiator) =
        derive_side(initiator_private, responder_public)?;
    let (responder_secret, responder_key, responder) =
        derive_side(responder_private, initiator_public)?;

    let secrets_match = initiator_secret == responder_secret;
    let keys_match = initiator_key == responder_key;
    let fingerprint = keys_match.then(|| fingerprint(&initiator_key));

    tracing::debug!(
        curve = %initiator_private.curve(),
        secrets_match,
        keys_match,
        "verified mutual derivation"
    );

    Ok(MutualDerivation {
        curve: initiator_private.curve(),
        secrets_match,
        keys_match,
        initiator,
        responder,
        fingerprint,
    })
}

fn derive_side(
    local: &PrivateKey,
    peer: &PublicKey,
) -> Result<(SharedSecret, DerivedKey, SideTiming), ExchangeError> {
    let start = Instant::now();
    let secret = compute_shared_secret(local, peer)?;
    let compute = start.elapsed();

    let start = Instant::now();
    let key = derive_symmetric_key(&secret)?;
    let derive = start.elapsed();

    Ok((secret, key, SideTiming { compute, derive }))
}

/// Short, non-reversible identifier for a derived key
pub fn fingerprint(key: &DerivedKey) -> String {
    let digest = Sha256::digest(key.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(FINGERPRINT_HEX_LEN);
    hex
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::keys::KeyPair;

    #[test]
    fn test_shared_secret_is_symmetric() {
        for curve in Curve::ALL {
            let alice = KeyPair::generate(curve);
            let bob = KeyPair::generate(curve);

            let ab = compute_shared_secret(alice.private_key(), bob.public_key()).unwrap();
            let ba = compute_shared_secret(bob.private_key(), alice.public_key()).unwrap();

            assert_eq!(ab, ba);
            assert_eq!(ab.len(), curve.shared_secret_size());
        }
    }

    #[test]
    fn test_curve_mismatch() {
        let alice = KeyPair::generate(Curve::P256);
        let bob = KeyPair::generate(Curve::P384);

        let err = compute_shared_secret(alice.private_key(), bob.public_key()).unwrap_err();
        match err {
            ExchangeError::CurveMismatch { local, peer } => {
                assert_eq!(local, Curve::P256);
                assert_eq!(peer, Curve::P384);
            }
            other => panic!("expected curve mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_sec1_peer_validation() {
        let alice = KeyPair::generate(Curve::P256);
        let bob = KeyPair::generate(Curve::P256);

        let sec1 = bob.public_key().to_sec1_bytes(false);
        let secret = compute_shared_secret_sec1(alice.private_key(), &sec1).unwrap();
        let expected = compute_shared_secret(alice.private_key(), bob.public_key()).unwrap();
        assert_eq!(secret, expected);

        let err = compute_shared_secret_sec1(alice.private_key(), &[0x00]).unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidPoint(_)));

        let mut off_curve = sec1.clone();
        let last = off_curve.len() - 1;
        off_curve[last] ^= 0x01;
        let err = compute_shared_secret_sec1(alice.private_key(), &off_curve).unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidPoint(_)));
    }

    #[test]
    fn test_mutual_derivation() {
        let alice = KeyPair::generate(Curve::P256);
        let bob = KeyPair::generate(Curve::P256);

        let result = verify_mutual_derivation(
            alice.private_key(),
            alice.public_key(),
            bob.private_key(),
            bob.public_key(),
        )
        .unwrap();

        assert!(result.secrets_match);
        assert!(result.keys_match);
        let fingerprint = result.fingerprint.unwrap();
        assert_eq!(fingerprint.len(), FINGERPRINT_HEX_LEN);
        assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_mutual_derivation_with_foreign_public_key() {
        let alice = KeyPair::generate(Curve::P256);
        let bob = KeyPair::generate(Curve::P256);
        let mallory = KeyPair::generate(Curve::P256);

        // alice's advertised public key is really mallory's
        let result = verify_mutual_derivation(
            alice.private_key(),
            mallory.public_key(),
            bob.private_key(),
            bob.public_key(),
        )
        .unwrap();

        assert!(!result.secrets_match);
        assert!(!result.keys_match);
        assert!(result.fingerprint.is_none());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let alice = KeyPair::generate(Curve::P256);
        let bob = KeyPair::generate(Curve::P256);
        let secret = compute_shared_secret(alice.private_key(), bob.public_key()).unwrap();
        assert_eq!(format!("{:?}", secret), "SharedSecret(32 bytes)");
    }
}
