//! Self-describing encrypted package and its JSON form
//!
//! ```json
//! {
//!   "algorithm": "AES-192-GCM",
//!   "nonce": "<base64>",
//!   "tag": "<base64>",
//!   "ciphertext": "<base64>",
//!   "original_filename": "report.pdf"
//! }
//! ```
//!
//! The `algorithm` field alone selects which cipher opens the package.

use serde::{Deserialize, Serialize};

pub const GCM_ALGORITHM: &str = "AES-192-GCM";
pub const CBC_ALGORITHM: &str = "AES-192-CBC";
/// File name used when a package does not carry one
pub const DEFAULT_FILENAME: &str = "decrypted_file";

#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("malformed package: {0}")]
    Malformed(String),
    #[error("unsupported algorithm: {0}")]
    Unsupported(String),
}

impl From<serde_json::Error> for PackageError {
    fn from(err: serde_json::Error) -> Self {
        PackageError::Malformed(err.to_string())
    }
}

/// Just the tag, read before the body
#[derive(Deserialize)]
struct PackageHeader {
    algorithm: String,
}

fn default_filename() -> String {
    DEFAULT_FILENAME.to_string()
}

/// Padding scheme recorded in block-mode packages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaddingScheme {
    #[default]
    #[serde(rename = "PKCS7")]
    Pkcs7,
}

/// Body of an AES-192-GCM package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcmPackage {
    #[serde(with = "b64")]
    pub nonce: Vec<u8>,
    #[serde(with = "b64")]
    pub tag: Vec<u8>,
    #[serde(with = "b64")]
    pub ciphertext: Vec<u8>,
    #[serde(default = "default_filename")]
    pub original_filename: String,
}

/// Body of an AES-192-CBC package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CbcPackage {
    #[serde(with = "b64")]
    pub iv: Vec<u8>,
    #[serde(with = "b64")]
    pub ciphertext: Vec<u8>,
    #[serde(default)]
    pub padding: PaddingScheme,
    #[serde(default = "default_filename")]
    pub original_filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm")]
pub enum EncryptedPackage {
    #[serde(rename = "AES-192-GCM")]
    Gcm(GcmPackage),
    #[serde(rename = "AES-192-CBC")]
    Cbc(CbcPackage),
}

impl From<GcmPackage> for EncryptedPackage {
    fn from(package: GcmPackage) -> Self {
        EncryptedPackage::Gcm(package)
    }
}

impl From<CbcPackage> for EncryptedPackage {
    fn from(package: CbcPackage) -> Self {
        EncryptedPackage::Cbc(package)
    }
}

impl EncryptedPackage {
    pub fn algorithm(&self) -> &'static str {
        match self {
            EncryptedPackage::Gcm(_) => GCM_ALGORITHM,
            EncryptedPackage::Cbc(_) => CBC_ALGORITHM,
        }
    }

    pub fn original_filename(&self) -> &str {
        match self {
            EncryptedPackage::Gcm(p) => &p.original_filename,
            EncryptedPackage::Cbc(p) => &p.original_filename,
        }
    }

    pub fn ciphertext(&self) -> &[u8] {
        match self {
            EncryptedPackage::Gcm(p) => &p.ciphertext,
            EncryptedPackage::Cbc(p) => &p.ciphertext,
        }
    }

    /// Pretty-printed JSON, two-space indent
    pub fn to_json(&self) -> Result<String, PackageError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, PackageError> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        let header = PackageHeader::deserialize(&value)?;
        let package = match header.algorithm.as_str() {
            GCM_ALGORITHM => EncryptedPackage::Gcm(GcmPackage::deserialize(&value)?),
            CBC_ALGORITHM => EncryptedPackage::Cbc(CbcPackage::deserialize(&value)?),
            other => return Err(PackageError::Unsupported(other.to_string())),
        };
        Ok(package)
    }
}

mod b64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.trim())
            .map_err(|e| D::Error::custom(format!("invalid base64: {}", e)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_gcm_package_json_shape() {
        let package = EncryptedPackage::from(GcmPackage {
            nonce: vec![1; 12],
            tag: vec![2; 16],
            ciphertext: b"hello".to_vec(),
            original_filename: "hello.txt".into(),
        });

        let json = package.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["algorithm"], "AES-192-GCM");
        assert_eq!(value["ciphertext"], "aGVsbG8=");
        assert_eq!(value["original_filename"], "hello.txt");
        assert!(json.contains("\n  \"nonce\""));

        assert_eq!(EncryptedPackage::from_json(json.as_bytes()).unwrap(), package);
    }

    #[test]
    fn test_cbc_package_json_shape() {
        let package = EncryptedPackage::from(CbcPackage {
            iv: vec![3; 16],
            ciphertext: vec![4; 32],
            padding: PaddingScheme::Pkcs7,
            original_filename: "notes.md".into(),
        });

        let value: serde_json::Value =
            serde_json::from_str(&package.to_json().unwrap()).unwrap();
        assert_eq!(value["algorithm"], "AES-192-CBC");
        assert_eq!(value["padding"], "PKCS7");
        assert!(value.get("tag").is_none());
    }

    #[test]
    fn test_missing_filename_defaults() {
        let json = r#"{"algorithm":"AES-192-CBC","iv":"AAAAAAAAAAAAAAAAAAAAAA==","ciphertext":"AAAAAAAAAAAAAAAAAAAAAA=="}"#;
        let package = EncryptedPackage::from_json(json.as_bytes()).unwrap();
        assert_eq!(package.original_filename(), DEFAULT_FILENAME);
        assert_eq!(package.algorithm(), CBC_ALGORITHM);
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let json = r#"{"algorithm":"AES-256-CTR","iv":"AAAA","ciphertext":"AAAA"}"#;
        let err = EncryptedPackage::from_json(json.as_bytes()).unwrap_err();
        assert!(matches!(err, PackageError::Unsupported(_)));
    }

    #[test]
    fn test_unknown_algorithm_names_it() {
        let json = r#"{"algorithm":"AES-256-CTR","iv":"AAAA","ciphertext":"AAAA"}"#;
        let err = EncryptedPackage::from_json(json.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "unsupported algorithm: AES-256-CTR");
    }

    #[test]
    fn test_bad_padding_is_malformed() {
        let json = r#"{"algorithm":"AES-192-CBC","iv":"AAAAAAAAAAAAAAAAAAAAAA==","ciphertext":"AAAAAAAAAAAAAAAAAAAAAA==","padding":"ZERO"}"#;
        let err = EncryptedPackage::from_json(json.as_bytes()).unwrap_err();
        assert!(matches!(err, PackageError::Malformed(_)));
        assert!(err.to_string().contains("ZERO"));
    }

    #[test]
    fn test_missing_algorithm_is_malformed() {
        let json = r#"{"iv":"AAAA","ciphertext":"AAAA"}"#;
        let err = EncryptedPackage::from_json(json.as_bytes()).unwrap_err();
        assert!(matches!(err, PackageError::Malformed(_)));
        assert!(err.to_string().contains("algorithm"));
    }

    #[test]
    fn test_bad_base64_rejected() {
        let json = r#"{"algorithm":"AES-192-GCM","nonce":"***","tag":"AAAA","ciphertext":"AAAA"}"#;
        let err = EncryptedPackage::from_json(json.as_bytes()).unwrap_err();
        assert!(matches!(err, PackageError::Malformed(_)));
    }

    #[test]
    fn test_not_json_rejected() {
        let err = EncryptedPackage::from_json(b"\x00\x01binary").unwrap_err();
        assert!(matches!(err, PackageError::Malformed(_)));
    }
}
