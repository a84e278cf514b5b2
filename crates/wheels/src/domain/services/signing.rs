//! Canonical parameter signing
//!
//! Both the bank gateway and Cloudinary sign a `key=value&...` string built
//! from parameters sorted by key. Nothing is escaped.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

/// `k1=v1&k2=v2...` with keys in byte order
pub fn canonical_param_string(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Base64 HMAC-SHA256 of the canonical string, keyed with the merchant hash
pub fn request_hash(params: &BTreeMap<String, String>, merchant_hash: &str) -> String {
    hmac_base64(merchant_hash.as_bytes(), canonical_param_string(params).as_bytes())
}

/// Hex SHA-256 of the canonical string followed by the API secret
pub fn cloudinary_signature(params: &BTreeMap<String, String>, api_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_param_string(params).as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn hmac_base64(key: &[u8], message: &[u8]) -> String {
    // HMAC accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    STANDARD.encode(mac.finalize().into_bytes())
}
