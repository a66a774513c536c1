//! HKDF-SHA256 derivation of the AES-192 session key
//!
//! The salt and info label are protocol constants, so two parties holding
//! the same shared secret always derive the same key.

use std::fmt;

use hkdf::Hkdf;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::exchange::{ExchangeError, SharedSecret};

/// Size of an AES-192 key in bytes
pub const DERIVED_KEY_SIZE: usize = 24;
/// HKDF salt: 32 zero bytes
pub const HKDF_SALT: [u8; 32] = [0u8; 32];
/// HKDF info label
pub const HKDF_INFO: &[u8] = b"AES-192-Key";

/// A 192-bit symmetric key derived from an ECDH shared secret
///
/// Zeroized on drop. Equality runs in constant time. `Debug` is redacted.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; DERIVED_KEY_SIZE]);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; DERIVED_KEY_SIZE] {
        &self.0
    }
}

impl From<[u8; DERIVED_KEY_SIZE]> for DerivedKey {
    fn from(bytes: [u8; DERIVED_KEY_SIZE]) -> Self {
        Self(bytes)
    }
}

impl PartialEq for DerivedKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for DerivedKey {}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

/// Derive the session key with the protocol salt and label
pub fn derive_symmetric_key(secret: &SharedSecret) -> Result<DerivedKey, ExchangeError> {
    derive_symmetric_key_with(secret, &HKDF_SALT, HKDF_INFO)
}

/// Derive a 24 byte key with an explicit salt and info label
pub fn derive_symmetric_key_with(
    secret: &SharedSecret,
    salt: &[u8],
    info: &[u8],
) -> Result<DerivedKey, ExchangeError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), secret.as_bytes());
    let mut okm = [0u8; DERIVED_KEY_SIZE];
    hk.expand(info, &mut okm)
        .map_err(|e| ExchangeError::Derivation(e.to_string()))?;
    Ok(DerivedKey(okm))
}
