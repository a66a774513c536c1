//! Shared test utilities for crypto integration tests
#![allow(dead_code)]

use common::crypto::{
    compute_shared_secret, derive_symmetric_key, Curve, DerivedKey, KeyPair,
};

/// Two named parties with freshly generated keys on the same curve
pub struct Parties {
    pub alice: KeyPair,
    pub bob: KeyPair,
}

pub fn setup_parties(curve: Curve) -> Parties {
    Parties {
        alice: KeyPair::generate(curve),
        bob: KeyPair::generate(curve),
    }
}

/// Derive the session key from `local`'s point of view
pub fn session_key(local: &KeyPair, peer: &KeyPair) -> DerivedKey {
    let secret = compute_shared_secret(local.private_key(), peer.public_key()).unwrap();
    derive_symmetric_key(&secret).unwrap()
}

/// Flip one bit in a base64 field of a JSON package, keeping it valid base64
pub fn tamper_field(json: &str, field: &str) -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    let mut value: serde_json::Value = serde_json::from_str(json).unwrap();
    let encoded = value[field].as_str().unwrap().to_string();
    let mut bytes = STANDARD.decode(encoded).unwrap();
    bytes[0] ^= 0x01;
    value[field] = serde_json::Value::String(STANDARD.encode(bytes));
    serde_json::to_string_pretty(&value).unwrap()
}
