//! Cryptographic pipeline for hybrid ECC / AES-192 encryption
//!
//! - **Keys**: P-256 (default) or P-384 key pairs, PEM in and out
//! - **Exchange**: ECDH between two parties plus HKDF-SHA256 down to a
//!   24 byte AES-192 key
//! - **Cipher**: AES-192-GCM or AES-192-CBC/PKCS#7, producing a
//!   self-describing JSON package
//!
//! # Protocol
//!
//! 1. Each party generates a key pair and publishes the public half
//! 2. Each side computes `ECDH(own private, peer public)`; both get the
//!    same shared secret
//! 3. `HKDF-SHA256(secret, salt = 32 zero bytes, info = "AES-192-Key")`
//!    yields the session key
//! 4. Either side seals a payload; the other opens it with the key it
//!    derived independently
//!
//! The salt is a fixed protocol constant rather than a per-session random
//! value so that independent implementations derive identical keys.
//!
//! Every function here is synchronous and holds no state between calls.
//! Secrets are zeroized on drop and never logged.

mod cipher;
mod exchange;
mod kdf;
mod keys;
mod package;
mod padding;

pub use cipher::{
    decrypt, encrypt, Aes192CbcCipher, Aes192GcmCipher, CipherError, CipherMode, Opened,
    PackageCipher, Sealed, CBC_IV_SIZE, GCM_NONCE_SIZE, GCM_TAG_SIZE, INTEGRITY_FAILURE,
};
pub use exchange::{
    compute_shared_secret, compute_shared_secret_sec1, fingerprint, verify_mutual_derivation,
    ExchangeError, MutualDerivation, SharedSecret, SideTiming, FINGERPRINT_HEX_LEN,
};
pub use kdf::{
    derive_symmetric_key, derive_symmetric_key_with, DerivedKey, DERIVED_KEY_SIZE, HKDF_INFO,
    HKDF_SALT,
};
pub use keys::{Curve, KeyError, KeyPair, PrivateKey, PublicKey, PRIVATE_KEY_TAG, PUBLIC_KEY_TAG};
pub use package::{
    CbcPackage, EncryptedPackage, GcmPackage, PackageError, PaddingScheme, CBC_ALGORITHM,
    DEFAULT_FILENAME, GCM_ALGORITHM,
};
pub use padding::{unpadded_len, InvalidPadding, BLOCK_SIZE};
