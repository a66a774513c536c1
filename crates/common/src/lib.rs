/**
 * Cryptographic types and operations.
 *  - Key pairs and their PEM encodings
 *  - ECDH key agreement and HKDF key derivation
 *  - AES-192 GCM / CBC encrypted packages
 */
pub mod crypto;
/**
 * Operation metrics and the sink trait
 *  collaborators implement to receive them.
 */
pub mod metrics;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::build_info;
    pub use crate::crypto::{
        CipherError, CipherMode, Curve, DerivedKey, EncryptedPackage, ExchangeError, KeyError,
        KeyPair, PackageError, PrivateKey, PublicKey,
    };
    pub use crate::metrics::{MetricsSink, OperationMetrics};
    pub use crate::version::BuildInfo;
}
