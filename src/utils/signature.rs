//! Payment webhook signatures.
//!
//! The provider sends `X-Payment-Signature: t=<unix>,v1=<hex>` where `v1`
//! is HMAC-SHA256 over `"{t}.{raw_body}"` keyed with the shared secret.

use sha2::{Digest, Sha256};

use crate::errors::{AppError, AppResult};

const BLOCK_SIZE: usize = 64;

/// Parsed signature header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    /// Candidate signatures; any match is accepted (secret rotation)
    pub signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> AppResult<Self> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => timestamp = value.parse::<i64>().ok(),
                "v1" => {
                    if let Ok(bytes) = hex::decode(value) {
                        signatures.push(bytes);
                    }
                }
                _ => {}
            }
        }

        match timestamp {
            Some(timestamp) if !signatures.is_empty() => Ok(Self {
                timestamp,
                signatures,
            }),
            _ => Err(AppError::InvalidSignature),
        }
    }
}

/// HMAC-SHA256 (RFC 2104).
pub fn hmac_sha256(secret: &[u8], message: &[u8]) -> [u8; 32] {
    let mut key_block = [0u8; BLOCK_SIZE];
    if secret.len() > BLOCK_SIZE {
        let digest = Sha256::digest(secret);
        key_block[..digest.len()].copy_from_slice(&digest);
    } else {
        key_block[..secret.len()].copy_from_slice(secret);
    }

    let i_key_pad = key_block.map(|b| b ^ 0x36);
    let o_key_pad = key_block.map(|b| b ^ 0x5c);

    let mut inner = Sha256::new();
    inner.update(i_key_pad);
    inner.update(message);
    let inner_hash = inner.finalize();

    let mut outer = Sha256::new();
    outer.update(o_key_pad);
    outer.update(inner_hash);
    outer.finalize().into()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Header value for `payload` signed at `timestamp`.
pub fn sign(secret: &[u8], timestamp: i64, payload: &[u8]) -> String {
    format!(
        "t={},v1={}",
        timestamp,
        hex::encode(hmac_sha256(secret, &signed_message(timestamp, payload)))
    )
}

fn signed_message(timestamp: i64, payload: &[u8]) -> Vec<u8> {
    let mut message = format!("{}.", timestamp).into_bytes();
    message.extend_from_slice(payload);
    message
}

/// Verify a signature header against the raw request body.
pub fn verify(
    secret: &[u8],
    header: &str,
    payload: &[u8],
    now: i64,
    tolerance_seconds: i64,
) -> AppResult<()> {
    let parsed = SignatureHeader::parse(header)?;

    if (now - parsed.timestamp).abs() > tolerance_seconds {
        tracing::warn!(
            timestamp = parsed.timestamp,
            now,
            "Webhook signature outside tolerance window"
        );
        return Err(AppError::InvalidSignature);
    }

    let expected = hmac_sha256(secret, &signed_message(parsed.timestamp, payload));
    if parsed
        .signatures
        .iter()
        .any(|candidate| constant_time_eq(&expected, candidate))
    {
        Ok(())
    } else {
        Err(AppError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"whsec_test_secret";

    #[test]
    fn matches_rfc4231_vector() {
        let mac = hmac_sha256(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            hex::encode(mac),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn accepts_freshly_signed_payload() {
        let body = br#"{"id":"evt_1"}"#;
        let header = sign(SECRET, 1_700_000_000, body);
        assert!(verify(SECRET, &header, body, 1_700_000_100, 300).is_ok());
    }

    #[test]
    fn rejects_tampered_body() {
        let header = sign(SECRET, 1_700_000_000, b"{\"amount\":\"10.00\"}");
        let result = verify(SECRET, &header, b"{\"amount\":\"1.00\"}", 1_700_000_000, 300);
        assert!(matches!(result, Err(AppError::InvalidSignature)));
    }

    #[test]
    fn rejects_stale_timestamps() {
        let body = b"{}";
        let header = sign(SECRET, 1_700_000_000, body);
        assert!(verify(SECRET, &header, body, 1_700_000_301, 300).is_err());
        assert!(verify(SECRET, &header, body, 1_699_999_699, 300).is_err());
    }

    #[test]
    fn rejects_wrong_secret() {
        let body = b"{}";
        let header = sign(b"other", 1_700_000_000, body);
        assert!(verify(SECRET, &header, body, 1_700_000_000, 300).is_err());
    }

    #[test]
    fn parses_multiple_signatures() {
        let header = format!("t=12, v1={}, v0=ignored, v1=zz, v1={}", "ab", "cd");
        let parsed = SignatureHeader::parse(&header).unwrap();
        assert_eq!(parsed.timestamp, 12);
        assert_eq!(parsed.signatures, vec![vec![0xab], vec![0xcd]]);
    }

    #[test]
    fn malformed_headers_are_invalid() {
        assert!(SignatureHeader::parse("").is_err());
        assert!(SignatureHeader::parse("t=abc,v1=00").is_err());
        assert!(SignatureHeader::parse("t=1").is_err());
    }
}
