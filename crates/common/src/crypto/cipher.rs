//! AES-192 payload encryption in two interchangeable modes
//!
//! - **GCM**: 96-bit random nonce, empty AAD, detached 128-bit tag
//! - **CBC**: 128-bit random IV, PKCS#7 padding, padding checked in
//!   constant time on the way back
//!
//! Both produce an [`EncryptedPackage`] that records which mode sealed it.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use aes::Aes192;
use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{AesGcm, Nonce, Tag};
use cbc::cipher::block_padding::{NoPadding, Pkcs7};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::kdf::DerivedKey;
use super::package::{
    CbcPackage, EncryptedPackage, GcmPackage, PackageError, PaddingScheme, CBC_ALGORITHM,
    GCM_ALGORITHM,
};
use super::padding::{self, BLOCK_SIZE};
use crate::metrics::OperationMetrics;

/// Size of a GCM nonce in bytes
pub const GCM_NONCE_SIZE: usize = 12;
/// Size of a GCM tag in bytes
pub const GCM_TAG_SIZE: usize = 16;
/// Size of a CBC IV in bytes
pub const CBC_IV_SIZE: usize = BLOCK_SIZE;

/// User-facing message for every integrity failure, whatever the mode
pub const INTEGRITY_FAILURE: &str =
    "decryption failed: the package is corrupt or was sealed under a different key";

type Aes192Gcm = AesGcm<Aes192, U12>;
type Aes192CbcEnc = cbc::Encryptor<Aes192>;
type Aes192CbcDec = cbc::Decryptor<Aes192>;

/// Errors that can occur during encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("{}", INTEGRITY_FAILURE)]
    Authentication,
    #[error("{}", INTEGRITY_FAILURE)]
    Padding,
    #[error(transparent)]
    Package(#[from] PackageError),
    #[error("failed to gather randomness: {0}")]
    Entropy(String),
    #[error("encryption failed: {0}")]
    Encryption(String),
    #[error("invalid key length")]
    KeyLength,
}

impl CipherError {
    /// Tag or padding failure; the two are reported identically
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, CipherError::Authentication | CipherError::Padding)
    }
}

/// Cipher mode, chosen once when a request comes in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherMode {
    #[default]
    Gcm,
    Cbc,
}

impl CipherMode {
    pub fn algorithm(&self) -> &'static str {
        match self {
            CipherMode::Gcm => GCM_ALGORITHM,
            CipherMode::Cbc => CBC_ALGORITHM,
        }
    }
}

impl fmt::Display for CipherMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CipherMode::Gcm => f.write_str("gcm"),
            CipherMode::Cbc => f.write_str("cbc"),
        }
    }
}

impl FromStr for CipherMode {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gcm" | "aead" | "aes-192-gcm" => Ok(CipherMode::Gcm),
            "cbc" | "block" | "aes-192-cbc" => Ok(CipherMode::Cbc),
            other => Err(PackageError::Unsupported(other.to_string())),
        }
    }
}

impl From<&EncryptedPackage> for CipherMode {
    fn from(package: &EncryptedPackage) -> Self {
        match package {
            EncryptedPackage::Gcm(_) => CipherMode::Gcm,
            EncryptedPackage::Cbc(_) => CipherMode::Cbc,
        }
    }
}

/// Shared contract for the two AES-192 modes
pub trait PackageCipher {
    type Package: Into<EncryptedPackage>;

    const ALGORITHM: &'static str;

    fn seal(
        key: &DerivedKey,
        plaintext: &[u8],
        original_filename: &str,
    ) -> Result<Self::Package, CipherError>;

    fn open(key: &DerivedKey, package: &Self::Package) -> Result<Vec<u8>, CipherError>;
}

/// AES-192-GCM
#[derive(Debug, Clone, Copy)]
pub struct Aes192GcmCipher;

impl PackageCipher for Aes192GcmCipher {
    type Package = GcmPackage;

    const ALGORITHM: &'static str = GCM_ALGORITHM;

    fn seal(
        key: &DerivedKey,
        plaintext: &[u8],
        original_filename: &str,
    ) -> Result<GcmPackage, CipherError> {
        let cipher =
            Aes192Gcm::new_from_slice(key.as_bytes()).map_err(|_| CipherError::KeyLength)?;
        let nonce = random_bytes::<GCM_NONCE_SIZE>()?;

        let mut buffer = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", &mut buffer)
            .map_err(|e| CipherError::Encryption(e.to_string()))?;

        Ok(GcmPackage {
            nonce: nonce.to_vec(),
            tag: tag.to_vec(),
            ciphertext: buffer,
            original_filename: original_filename.to_string(),
        })
    }

    fn open(key: &DerivedKey, package: &GcmPackage) -> Result<Vec<u8>, CipherError> {
        if package.nonce.len() != GCM_NONCE_SIZE {
            return Err(PackageError::Malformed(format!(
                "nonce must be {} bytes, got {}",
                GCM_NONCE_SIZE,
                package.nonce.len()
            ))
            .into());
        }
        if package.tag.len() != GCM_TAG_SIZE {
            return Err(CipherError::Authentication);
        }

        let cipher =
            Aes192Gcm::new_from_slice(key.as_bytes()).map_err(|_| CipherError::KeyLength)?;

        // Zeroized on drop, so a failed open leaves no partial plaintext behind
        let mut buffer = Zeroizing::new(package.ciphertext.clone());
        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(&package.nonce),
                b"",
                buffer.as_mut_slice(),
                Tag::from_slice(&package.tag),
            )
            .map_err(|_| CipherError::Authentication)?;

        Ok(std::mem::take(&mut *buffer))
    }
}

/// AES-192-CBC with PKCS#7 padding
#[derive(Debug, Clone, Copy)]
pub struct Aes192CbcCipher;

impl PackageCipher for Aes192CbcCipher {
    type Package = CbcPackage;

    const ALGORITHM: &'static str = CBC_ALGORITHM;

    fn seal(
        key: &DerivedKey,
        plaintext: &[u8],
        original_filename: &str,
    ) -> Result<CbcPackage, CipherError> {
        let iv = random_bytes::<CBC_IV_SIZE>()?;
        let ciphertext = Aes192CbcEnc::new_from_slices(key.as_bytes(), &iv)
            .map_err(|_| CipherError::KeyLength)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        Ok(CbcPackage {
            iv: iv.to_vec(),
            ciphertext,
            padding: PaddingScheme::Pkcs7,
            original_filename: original_filename.to_string(),
        })
    }

    fn open(key: &DerivedKey, package: &CbcPackage) -> Result<Vec<u8>, CipherError> {
        if package.iv.len() != CBC_IV_SIZE {
            return Err(PackageError::Malformed(format!(
                "iv must be {} bytes, got {}",
                CBC_IV_SIZE,
                package.iv.len()
            ))
            .into());
        }
        let ciphertext = &package.ciphertext;
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(CipherError::Padding);
        }

        let mut buffer = Zeroizing::new(
            Aes192CbcDec::new_from_slices(key.as_bytes(), &package.iv)
                .map_err(|_| CipherError::KeyLength)?
                .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
                .map_err(|_| CipherError::Padding)?,
        );

        let len = padding::unpadded_len(&buffer).map_err(|_| CipherError::Padding)?;
        buffer.truncate(len);

        Ok(std::mem::take(&mut *buffer))
    }
}

/// Result of [`encrypt`]
#[derive(Debug, Clone)]
pub struct Sealed {
    pub package: EncryptedPackage,
    pub metrics: OperationMetrics,
}

/// Result of [`decrypt`]
#[derive(Debug, Clone)]
pub struct Opened {
    pub plaintext: Vec<u8>,
    pub original_filename: String,
    pub metrics: OperationMetrics,
}

/// Encrypt `plaintext` under `key` in the given mode
pub fn encrypt(
    key: &DerivedKey,
    mode: CipherMode,
    plaintext: &[u8],
    original_filename: &str,
) -> Result<Sealed, CipherError> {
    let start = Instant::now();
    let package: EncryptedPackage = match mode {
        CipherMode::Gcm => Aes192GcmCipher::seal(key, plaintext, original_filename)?.into(),
        CipherMode::Cbc => Aes192CbcCipher::seal(key, plaintext, original_filename)?.into(),
    };
    let metrics = OperationMetrics::new(
        format!("encrypt {}", mode.algorithm()),
        start.elapsed(),
        plaintext.len(),
        package.ciphertext().len(),
    );

    tracing::debug!(
        algorithm = mode.algorithm(),
        bytes_in = metrics.bytes_in,
        bytes_out = metrics.bytes_out,
        elapsed_ms = metrics.elapsed.as_secs_f64() * 1000.0,
        "sealed package"
    );

    Ok(Sealed { package, metrics })
}

/// Decrypt a package, choosing the mode from its `algorithm` field
pub fn decrypt(key: &DerivedKey, package: &EncryptedPackage) -> Result<Opened, CipherError> {
    let start = Instant::now();
    let result = match package {
        EncryptedPackage::Gcm(p) => Aes192GcmCipher::open(key, p),
        EncryptedPackage::Cbc(p) => Aes192CbcCipher::open(key, p),
    };

    let plaintext = match result {
        Ok(plaintext) => plaintext,
        Err(e) => {
            tracing::debug!(algorithm = package.algorithm(), error = %e, "failed to open package");
            return Err(e);
        }
    };

    let metrics = OperationMetrics::new(
        format!("decrypt {}", package.algorithm()),
        start.elapsed(),
        package.ciphertext().len(),
        plaintext.len(),
    );

    tracing::debug!(
        algorithm = package.algorithm(),
        bytes_in = metrics.bytes_in,
        bytes_out = metrics.bytes_out,
        elapsed_ms = metrics.elapsed.as_secs_f64() * 1000.0,
        "opened package"
    );

    Ok(Opened {
        plaintext,
        original_filename: package.original_filename().to_string(),
        metrics,
    })
}

fn random_bytes<const N: usize>() -> Result<[u8; N], CipherError> {
    let mut buf = [0u8; N];
    getrandom::getrandom(&mut buf).map_err(|e| CipherError::Entropy(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod test {
    use super::*;

    fn key(byte: u8) -> DerivedKey {
        DerivedKey::from([byte; 24])
    }

    #[test]
    fn test_gcm_round_trip() {
        let sealed = encrypt(&key(1), CipherMode::Gcm, b"hello test", "hello.txt").unwrap();
        let EncryptedPackage::Gcm(ref body) = sealed.package else {
            panic!("expected a GCM package");
        };
        assert_eq!(body.nonce.len(), GCM_NONCE_SIZE);
        assert_eq!(body.tag.len(), GCM_TAG_SIZE);
        assert_eq!(body.ciphertext.len(), 10);

        let opened = decrypt(&key(1), &sealed.package).unwrap();
        assert_eq!(opened.plaintext, b"hello test");
        assert_eq!(opened.original_filename, "hello.txt");
    }

    #[test]
    fn test_cbc_round_trip() {
        for len in [0usize, 1, 15, 16, 17, 100] {
            let data = vec![0x5a; len];
            let sealed = encrypt(&key(2), CipherMode::Cbc, &data, "data.bin").unwrap();
            let expected_len = (len / BLOCK_SIZE + 1) * BLOCK_SIZE;
            assert_eq!(sealed.package.ciphertext().len(), expected_len);

            let opened = decrypt(&key(2), &sealed.package).unwrap();
            assert_eq!(opened.plaintext, data);
        }
    }

    #[test]
    fn test_nonces_are_fresh() {
        let a = Aes192GcmCipher::seal(&key(1), b"same", "f").unwrap();
        let b = Aes192GcmCipher::seal(&key(1), b"same", "f").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_gcm_bit_flips_fail_authentication() {
        let sealed = Aes192GcmCipher::seal(&key(3), b"attack at dawn", "f").unwrap();

        let mut tampered = sealed.clone();
        tampered.ciphertext[0] ^= 0x01;
        let err = Aes192GcmCipher::open(&key(3), &tampered).unwrap_err();
        assert!(matches!(err, CipherError::Authentication));

        let mut tampered = sealed.clone();
        tampered.tag[15] ^= 0x80;
        let err = Aes192GcmCipher::open(&key(3), &tampered).unwrap_err();
        assert!(matches!(err, CipherError::Authentication));
    }

    #[test]
    fn test_gcm_wrong_key_fails_authentication() {
        let sealed = Aes192GcmCipher::seal(&key(3), b"attack at dawn", "f").unwrap();
        let err = Aes192GcmCipher::open(&key(4), &sealed).unwrap_err();
        assert!(matches!(err, CipherError::Authentication));
    }

    #[test]
    fn test_gcm_field_lengths() {
        let sealed = Aes192GcmCipher::seal(&key(3), b"payload", "f").unwrap();

        let mut short_tag = sealed.clone();
        short_tag.tag.truncate(12);
        let err = Aes192GcmCipher::open(&key(3), &short_tag).unwrap_err();
        assert!(matches!(err, CipherError::Authentication));

        let mut long_nonce = sealed;
        long_nonce.nonce.push(0);
        let err = Aes192GcmCipher::open(&key(3), &long_nonce).unwrap_err();
        assert!(matches!(
            err,
            CipherError::Package(PackageError::Malformed(_))
        ));
    }

    #[test]
    fn test_cbc_truncated_ciphertext_is_padding_error() {
        let mut sealed = Aes192CbcCipher::seal(&key(5), &[7u8; 40], "f").unwrap();
        sealed.ciphertext.truncate(sealed.ciphertext.len() - 1);
        let err = Aes192CbcCipher::open(&key(5), &sealed).unwrap_err();
        assert!(matches!(err, CipherError::Padding));

        sealed.ciphertext.clear();
        let err = Aes192CbcCipher::open(&key(5), &sealed).unwrap_err();
        assert!(matches!(err, CipherError::Padding));
    }

    #[test]
    fn test_cbc_wrong_key_is_rejected() {
        // A wrong key yields random-looking padding; a valid 0x01 tail is
        // possible, so only require that the original text never comes back
        let sealed = Aes192CbcCipher::seal(&key(6), b"secret message!", "f").unwrap();
        match Aes192CbcCipher::open(&key(7), &sealed) {
            Err(err) => assert!(matches!(err, CipherError::Padding)),
            Ok(plaintext) => assert_ne!(plaintext, b"secret message!"),
        }
    }

    #[test]
    fn test_integrity_failures_share_a_message() {
        assert_eq!(
            CipherError::Authentication.to_string(),
            CipherError::Padding.to_string()
        );
        assert!(CipherError::Padding.is_integrity_failure());
        assert!(!CipherError::KeyLength.is_integrity_failure());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("gcm".parse::<CipherMode>().unwrap(), CipherMode::Gcm);
        assert_eq!("CBC".parse::<CipherMode>().unwrap(), CipherMode::Cbc);
        assert_eq!("AES-192-GCM".parse::<CipherMode>().unwrap(), CipherMode::Gcm);
        assert!("ctr".parse::<CipherMode>().is_err());
        assert_eq!(CipherMode::default(), CipherMode::Gcm);
        assert_eq!(CipherMode::Cbc.to_string(), "cbc");
    }

    #[test]
    fn test_metrics_reported() {
        let sealed = encrypt(&key(8), CipherMode::Gcm, &[0u8; 64], "f").unwrap();
        assert_eq!(sealed.metrics.bytes_in, 64);
        assert_eq!(sealed.metrics.bytes_out, 64);
        assert_eq!(sealed.metrics.operation, "encrypt AES-192-GCM");

        let opened = decrypt(&key(8), &sealed.package).unwrap();
        assert_eq!(opened.metrics.operation, "decrypt AES-192-GCM");
        assert_eq!(opened.metrics.bytes_out, 64);
    }
}
