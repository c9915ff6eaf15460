//! Webhook signature verification.
//!
//! Providers sign `"{timestamp}.{raw_body}"` with HMAC-SHA256 and send
//! `t=<unix>,v1=<hex>` in the signature header. Verification happens before
//! any payload parsing, uses a constant-time comparison, and rejects
//! timestamps outside the configured tolerance window.

use economy_core::{EconomyError, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Parsed `t=...,v1=...` signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signature_hex: String,
}

pub fn parse_header(header: &str) -> Result<SignatureHeader> {
    let mut timestamp = None;
    let mut signature_hex = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = value.parse::<i64>().ok();
            }
            Some(("v1", value)) => {
                signature_hex = Some(value.to_string());
            }
            _ => {}
        }
    }
    match (timestamp, signature_hex) {
        (Some(timestamp), Some(signature_hex)) => Ok(SignatureHeader {
            timestamp,
            signature_hex,
        }),
        _ => Err(EconomyError::Validation(
            "malformed signature header".to_string(),
        )),
    }
}

/// Verify a webhook body against its signature header.
pub fn verify(
    secret: &str,
    header: &str,
    raw_body: &[u8],
    now_unix: i64,
    tolerance_secs: i64,
) -> Result<()> {
    let parsed = parse_header(header)?;

    if (now_unix - parsed.timestamp).abs() > tolerance_secs {
        return Err(EconomyError::InvalidSignature);
    }

    let expected = hex::decode(&parsed.signature_hex)
        .map_err(|_| EconomyError::InvalidSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| EconomyError::ExternalDependency(format!("hmac key error: {e}")))?;
    mac.update(parsed.timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(raw_body);

    // verify_slice is constant-time.
    mac.verify_slice(&expected)
        .map_err(|_| EconomyError::InvalidSignature)
}

/// Produce a signature header for a payload. Used by tests and local tools.
pub fn sign(secret: &str, raw_body: &[u8], timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("hmac accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(raw_body);
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={signature}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const BODY: &[u8] = br#"{"id":"evt_1"}"#;

    #[test]
    fn valid_signature_passes() {
        let header = sign(SECRET, BODY, 1_700_000_000);
        verify(SECRET, &header, BODY, 1_700_000_010, 300).expect("valid");
    }

    #[test]
    fn tampered_body_fails() {
        let header = sign(SECRET, BODY, 1_700_000_000);
        let err = verify(SECRET, &header, br#"{"id":"evt_2"}"#, 1_700_000_010, 300)
            .expect_err("tampered");
        assert!(matches!(err, EconomyError::InvalidSignature));
    }

    #[test]
    fn wrong_secret_fails() {
        let header = sign(SECRET, BODY, 1_700_000_000);
        let err = verify("whsec_other", &header, BODY, 1_700_000_010, 300).expect_err("wrong key");
        assert!(matches!(err, EconomyError::InvalidSignature));
    }

    #[test]
    fn stale_timestamp_fails() {
        let header = sign(SECRET, BODY, 1_700_000_000);
        let err = verify(SECRET, &header, BODY, 1_700_000_000 + 301, 300).expect_err("stale");
        assert!(matches!(err, EconomyError::InvalidSignature));
    }

    #[test]
    fn malformed_header_is_a_validation_error() {
        let err = verify(SECRET, "v1=abcdef", BODY, 0, 300).expect_err("no timestamp");
        assert!(matches!(err, EconomyError::Validation(_)));
        let err = verify(SECRET, "nonsense", BODY, 0, 300).expect_err("nonsense");
        assert!(matches!(err, EconomyError::Validation(_)));
    }
}
