//! Cloud Storage V4 signed URLs with an HMAC key
//!
//! Implements the `GOOG4-HMAC-SHA256` scheme: a canonical request is hashed
//! into a string-to-sign, which is signed with a key derived from the HMAC
//! secret, the date and the `auto/storage/goog4_request` scope.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::domain::errors::DomainError;

type HmacSha256 = Hmac<Sha256>;

pub const STORAGE_HOST: &str = "storage.googleapis.com";
const ALGORITHM: &str = "GOOG4-HMAC-SHA256";
const REGION: &str = "auto";
const SERVICE: &str = "storage";
const REQUEST_TYPE: &str = "goog4_request";
const MAX_EXPIRY_SECS: i64 = 7 * 24 * 60 * 60;

/// HMAC credentials of a service account
#[derive(Clone)]
pub struct HmacKey {
    pub access_id: String,
    pub secret: String,
}

impl std::fmt::Debug for HmacKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacKey")
            .field("access_id", &self.access_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// What to sign
#[derive(Debug, Clone)]
pub struct SignedUrlRequest {
    pub method: String,
    pub bucket: String,
    pub object: String,
    /// Extra headers the client must send; names are lowercased when signed
    pub headers: BTreeMap<String, String>,
    pub expires_in: Duration,
    pub now: DateTime<Utc>,
}

impl SignedUrlRequest {
    /// A `PUT` upload URL for `object` with the given content type
    pub fn upload(
        bucket: impl Into<String>,
        object: impl Into<String>,
        content_type: impl Into<String>,
        expires_in: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), content_type.into());
        Self {
            method: "PUT".to_string(),
            bucket: bucket.into(),
            object: object.into(),
            headers,
            expires_in,
            now,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn canonical_path(bucket: &str, object: &str) -> String {
    let object = object
        .trim_start_matches('/')
        .split('/')
        .map(encode)
        .collect::<Vec<_>>()
        .join("/");
    format!("/{}/{}", encode(bucket), object)
}

fn hmac_bytes(key: &[u8], message: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Produce a signed URL valid for `request.expires_in` from `request.now`
pub fn sign_url(key: &HmacKey, request: &SignedUrlRequest) -> Result<String, DomainError> {
    let expires = request.expires_in.num_seconds();
    if !(1..=MAX_EXPIRY_SECS).contains(&expires) {
        return Err(DomainError::Validation(format!(
            "expiry must be between 1 second and 7 days, got {expires}s"
        )));
    }
    if request.object.trim_matches('/').is_empty() {
        return Err(DomainError::Validation("object path is required".into()));
    }

    let date = request.now.format("%Y%m%d").to_string();
    let datetime = request.now.format("%Y%m%dT%H%M%SZ").to_string();
    let scope = format!("{date}/{REGION}/{SERVICE}/{REQUEST_TYPE}");

    let mut headers: BTreeMap<String, String> = request
        .headers
        .iter()
        .map(|(name, value)| (name.to_lowercase(), value.trim().to_string()))
        .collect();
    headers.insert("host".to_string(), STORAGE_HOST.to_string());

    let signed_headers = headers.keys().cloned().collect::<Vec<_>>().join(";");
    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect();

    let mut query = BTreeMap::new();
    query.insert("X-Goog-Algorithm", ALGORITHM.to_string());
    query.insert("X-Goog-Credential", format!("{}/{}", key.access_id, scope));
    query.insert("X-Goog-Date", datetime.clone());
    query.insert("X-Goog-Expires", expires.to_string());
    query.insert("X-Goog-SignedHeaders", signed_headers.clone());
    let canonical_query = query
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let path = canonical_path(&request.bucket, &request.object);
    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\nUNSIGNED-PAYLOAD",
        request.method.to_uppercase(),
        path,
        canonical_query,
        canonical_headers,
        signed_headers
    );

    let string_to_sign = format!(
        "{ALGORITHM}\n{datetime}\n{scope}\n{}",
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let mut signing_key = format!("GOOG4{}", key.secret).into_bytes();
    for part in [date.as_str(), REGION, SERVICE, REQUEST_TYPE] {
        signing_key = hmac_bytes(&signing_key, part);
    }
    let signature = hex::encode(hmac_bytes(&signing_key, &string_to_sign));

    Ok(format!(
        "https://{STORAGE_HOST}{path}?{canonical_query}&X-Goog-Signature={signature}"
    ))
}
