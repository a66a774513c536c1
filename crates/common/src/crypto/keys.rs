use std::fmt;
use std::str::FromStr;

use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::{DecodePrivateKey, EncodePrivateKey, PrivateKeyInfo};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use spki::der::Decode;
use spki::{EncodePublicKey, ObjectIdentifier, SubjectPublicKeyInfoRef};
use zeroize::Zeroizing;

/// PEM tag used for PKCS#8 private keys
pub const PRIVATE_KEY_TAG: &str = "PRIVATE KEY";
/// PEM tag used for SubjectPublicKeyInfo public keys
pub const PUBLIC_KEY_TAG: &str = "PUBLIC KEY";

/// id-ecPublicKey (RFC 5480)
const EC_PUBLIC_KEY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
/// secp256r1 / prime256v1
const SECP256R1_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
/// secp384r1
const SECP384R1_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");

/// Errors that can occur while generating, encoding or decoding keys
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("malformed key: {0}")]
    Format(String),
    #[error("invalid curve point: {0}")]
    InvalidPoint(String),
}

/// Named prime curves supported for key agreement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Curve {
    /// NIST P-256 (secp256r1), the default
    #[default]
    #[serde(rename = "P-256")]
    P256,
    /// NIST P-384 (secp384r1)
    #[serde(rename = "P-384")]
    P384,
}

impl Curve {
    pub const ALL: [Curve; 2] = [Curve::P256, Curve::P384];

    pub fn name(&self) -> &'static str {
        match self {
            Curve::P256 => "P-256",
            Curve::P384 => "P-384",
        }
    }

    /// Size in bytes of the raw ECDH output on this curve
    pub fn shared_secret_size(&self) -> usize {
        match self {
            Curve::P256 => 32,
            Curve::P384 => 48,
        }
    }

    fn oid(&self) -> ObjectIdentifier {
        match self {
            Curve::P256 => SECP256R1_OID,
            Curve::P384 => SECP384R1_OID,
        }
    }

    fn from_oid(oid: ObjectIdentifier) -> Result<Self, KeyError> {
        Curve::ALL
            .into_iter()
            .find(|curve| curve.oid() == oid)
            .ok_or_else(|| KeyError::Format(format!("unsupported curve OID {}", oid)))
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Curve {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "p-256" | "p256" | "secp256r1" | "prime256v1" => Ok(Curve::P256),
            "p-384" | "p384" | "secp384r1" => Ok(Curve::P384),
            other => Err(KeyError::Format(format!("unknown curve: {}", other))),
        }
    }
}

#[derive(Clone)]
pub(crate) enum Scalar {
    P256(p256::SecretKey),
    P384(p384::SecretKey),
}

#[derive(Clone, PartialEq, Eq)]
pub(crate) enum Point {
    P256(p256::PublicKey),
    P384(p384::PublicKey),
}

/// Private half of an elliptic-curve key pair
///
/// The scalar is zeroized on drop by the underlying curve implementation.
/// `Debug` never prints key material.
///
/// # Examples
///
/// ```ignore
/// let private = PrivateKey::generate(Curve::P256);
/// let pem = private.to_pem()?;
/// let recovered = PrivateKey::from_pem(&pem)?;
/// assert_eq!(private.public_key(), recovered.public_key());
/// ```
#[derive(Clone)]
pub struct PrivateKey(pub(crate) Scalar);

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("curve", &self.curve())
            .finish_non_exhaustive()
    }
}

impl PrivateKey {
    /// Generate a new random private scalar using the OS CSPRNG
    pub fn generate(curve: Curve) -> Self {
        match curve {
            Curve::P256 => Self(Scalar::P256(p256::SecretKey::random(&mut OsRng))),
            Curve::P384 => Self(Scalar::P384(p384::SecretKey::random(&mut OsRng))),
        }
    }

    pub fn curve(&self) -> Curve {
        match &self.0 {
            Scalar::P256(_) => Curve::P256,
            Scalar::P384(_) => Curve::P384,
        }
    }

    /// Derive the public key for this scalar
    pub fn public_key(&self) -> PublicKey {
        match &self.0 {
            Scalar::P256(key) => PublicKey(Point::P256(key.public_key())),
            Scalar::P384(key) => PublicKey(Point::P384(key.public_key())),
        }
    }

    /// Encode as an unencrypted PKCS#8 PEM document with tag "PRIVATE KEY"
    pub fn to_pem(&self) -> Result<Zeroizing<String>, KeyError> {
        let der = match &self.0 {
            Scalar::P256(key) => key.to_pkcs8_der(),
            Scalar::P384(key) => key.to_pkcs8_der(),
        }
        .map_err(|e| KeyError::Format(format!("PKCS#8 encoding failed: {}", e)))?;

        Ok(Zeroizing::new(encode_pem(PRIVATE_KEY_TAG, der.as_bytes())))
    }

    /// Parse a PKCS#8 PEM private key
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Format`] if:
    /// - The PEM envelope is malformed or its tag is not "PRIVATE KEY"
    /// - The DER body is not an EC PKCS#8 structure
    /// - The curve is not supported
    pub fn from_pem(pem_str: &str) -> Result<Self, KeyError> {
        let pem = decode_pem(pem_str, PRIVATE_KEY_TAG)?;
        let der = Zeroizing::new(pem.into_contents());

        let info = PrivateKeyInfo::try_from(der.as_slice())
            .map_err(|e| KeyError::Format(format!("invalid PKCS#8 structure: {}", e)))?;
        if info.algorithm.oid != EC_PUBLIC_KEY_OID {
            return Err(KeyError::Format(format!(
                "not an EC private key (algorithm {})",
                info.algorithm.oid
            )));
        }
        let curve_oid = info
            .algorithm
            .parameters_oid()
            .map_err(|e| KeyError::Format(format!("missing curve parameters: {}", e)))?;

        let scalar = match Curve::from_oid(curve_oid)? {
            Curve::P256 => p256::SecretKey::from_pkcs8_der(&der).map(Scalar::P256),
            Curve::P384 => p384::SecretKey::from_pkcs8_der(&der).map(Scalar::P384),
        }
        .map_err(|e| KeyError::Format(format!("invalid private key: {}", e)))?;

        Ok(Self(scalar))
    }
}

/// Public half of an elliptic-curve key pair
///
/// A `PublicKey` always holds a validated point: on its curve and not the
/// identity. Every constructor checks this, so key agreement never sees an
/// invalid peer point.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(pub(crate) Point);

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey")
            .field(&self.curve())
            .field(&hex::encode(self.to_sec1_bytes(true)))
            .finish()
    }
}

impl PublicKey {
    pub fn curve(&self) -> Curve {
        match &self.0 {
            Point::P256(_) => Curve::P256,
            Point::P384(_) => Curve::P384,
        }
    }

    /// Decode a SEC1 encoded point (compressed or uncompressed) on `curve`
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidPoint`] for the identity encoding, for points
    /// that are not on the curve, and for encodings of the wrong length.
    pub fn from_sec1_bytes(curve: Curve, bytes: &[u8]) -> Result<Self, KeyError> {
        let point = match curve {
            Curve::P256 => p256::PublicKey::from_sec1_bytes(bytes).map(Point::P256),
            Curve::P384 => p384::PublicKey::from_sec1_bytes(bytes).map(Point::P384),
        }
        .map_err(|_| {
            KeyError::InvalidPoint(format!(
                "{} byte encoding is not a valid {} point",
                bytes.len(),
                curve
            ))
        })?;
        Ok(Self(point))
    }

    /// SEC1 encoding of the point
    pub fn to_sec1_bytes(&self, compress: bool) -> Vec<u8> {
        match &self.0 {
            Point::P256(key) => key.to_encoded_point(compress).as_bytes().to_vec(),
            Point::P384(key) => key.to_encoded_point(compress).as_bytes().to_vec(),
        }
    }

    /// Encode as a SubjectPublicKeyInfo PEM document with tag "PUBLIC KEY"
    pub fn to_pem(&self) -> Result<String, KeyError> {
        let der = match &self.0 {
            Point::P256(key) => key.to_public_key_der(),
            Point::P384(key) => key.to_public_key_der(),
        }
        .map_err(|e| KeyError::Format(format!("SPKI encoding failed: {}", e)))?;

        Ok(encode_pem(PUBLIC_KEY_TAG, der.as_bytes()))
    }

    /// Parse a SubjectPublicKeyInfo PEM public key
    ///
    /// The structure is decoded first and the curve read from its parameters;
    /// the point itself is validated separately so a well-formed document
    /// carrying a bad point is reported as [`KeyError::InvalidPoint`].
    pub fn from_pem(pem_str: &str) -> Result<Self, KeyError> {
        let pem = decode_pem(pem_str, PUBLIC_KEY_TAG)?;

        let spki = SubjectPublicKeyInfoRef::from_der(pem.contents())
            .map_err(|e| KeyError::Format(format!("invalid SubjectPublicKeyInfo: {}", e)))?;
        if spki.algorithm.oid != EC_PUBLIC_KEY_OID {
            return Err(KeyError::Format(format!(
                "not an EC public key (algorithm {})",
                spki.algorithm.oid
            )));
        }
        let curve_oid = spki
            .algorithm
            .parameters_oid()
            .map_err(|e| KeyError::Format(format!("missing curve parameters: {}", e)))?;
        let curve = Curve::from_oid(curve_oid)?;

        let point = spki
            .subject_public_key
            .as_bytes()
            .ok_or_else(|| KeyError::Format("public key bit string is not octet aligned".into()))?;

        Self::from_sec1_bytes(curve, point)
    }
}

/// An elliptic-curve key pair owned by one party
///
/// Immutable once built: the public half is always derived from the private
/// half, so the two can never disagree about their curve.
#[derive(Clone, Debug)]
pub struct KeyPair {
    private: PrivateKey,
    public: PublicKey,
}

impl From<PrivateKey> for KeyPair {
    fn from(private: PrivateKey) -> Self {
        let public = private.public_key();
        Self { private, public }
    }
}

impl KeyPair {
    /// Generate a fresh key pair on `curve`
    pub fn generate(curve: Curve) -> Self {
        let pair = Self::from(PrivateKey::generate(curve));
        tracing::debug!(curve = %curve, "generated key pair");
        pair
    }

    pub fn curve(&self) -> Curve {
        self.private.curve()
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn export_public_key(&self) -> Result<String, KeyError> {
        self.public.to_pem()
    }

    pub fn export_private_key(&self) -> Result<Zeroizing<String>, KeyError> {
        self.private.to_pem()
    }

    /// Rebuild a key pair from its exported private key
    pub fn import_private_key(pem_str: &str) -> Result<Self, KeyError> {
        PrivateKey::from_pem(pem_str).map(Self::from)
    }
}

fn encode_pem(tag: &str, der: &[u8]) -> String {
    let pem = pem::Pem::new(tag, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

fn decode_pem(pem_str: &str, expected_tag: &str) -> Result<pem::Pem, KeyError> {
    let pem =
        pem::parse(pem_str).map_err(|e| KeyError::Format(format!("failed to parse PEM: {}", e)))?;
    if pem.tag() != expected_tag {
        return Err(KeyError::Format(format!(
            "invalid PEM tag, expected {}, got {}",
            expected_tag,
            pem.tag()
        )));
    }
    Ok(pem)
}
