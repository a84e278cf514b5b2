//! Stripe webhook signatures
//!
//! Stripe sends `Stripe-Signature: t=<unix>,v1=<hex>[,v1=<hex>]`. The
//! signature is HMAC-SHA256 over `"{t}.{raw body}"` with the endpoint secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::domain::errors::DomainError;

type HmacSha256 = Hmac<Sha256>;

/// Stripe's default tolerance for the signed timestamp
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

const SCHEME: &str = "v1";

#[derive(Debug)]
struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> Result<SignatureHeader, DomainError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for item in header.split(',') {
        let Some((key, value)) = item.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                timestamp = Some(value.parse::<i64>().map_err(|_| {
                    DomainError::Signature("Unable to extract timestamp from header".into())
                })?);
            }
            SCHEME => {
                // Non-hex entries can never match; skip them
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| DomainError::Signature("Unable to extract timestamp from header".into()))?;
    if signatures.is_empty() {
        return Err(DomainError::Signature(
            "No signatures found with expected scheme".into(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn mac_for(secret: &str, timestamp: i64, payload: &[u8]) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

/// Verify a webhook payload against its `Stripe-Signature` header
pub fn verify(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), DomainError> {
    let parsed = parse_header(header)?;

    let matched = parsed.signatures.iter().any(|candidate| {
        mac_for(secret, parsed.timestamp, payload)
            .verify_slice(candidate)
            .is_ok()
    });
    if !matched {
        return Err(DomainError::Signature(
            "No signatures found matching the expected signature for payload".into(),
        ));
    }

    if tolerance_secs > 0 && (now - parsed.timestamp).abs() > tolerance_secs {
        return Err(DomainError::Signature(
            "Timestamp outside the tolerance zone".into(),
        ));
    }

    Ok(())
}

/// Produce a header Stripe would send for this payload
pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let signature = mac_for(secret, timestamp, payload).finalize().into_bytes();
    format!("t={},{}={}", timestamp, SCHEME, hex::encode(signature))
}
