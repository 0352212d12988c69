//! Stripe webhook signature verification.
//!
//! Stripe signs webhook requests using HMAC-SHA256 over `"{timestamp}.{body}"`.
//! Reference: https://docs.stripe.com/webhooks#verify-manually

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Name of the header carrying the signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Reasons a webhook signature is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header missing")]
    MissingHeader,

    #[error("malformed signature header: {0}")]
    Malformed(&'static str),

    #[error("no v1 signatures found in header")]
    NoSignatures,

    #[error("timestamp outside tolerance: age {age_seconds}s, max {max_age_seconds}s")]
    Stale { age_seconds: u64, max_age_seconds: u64 },

    #[error("no signature matched the payload")]
    Mismatch,
}

/// Parsed `Stripe-Signature` header.
///
/// Format: `t=<timestamp>,v1=<hex>[,v1=<hex>...][,v0=<hex>]`. Stripe sends
/// several `v1` entries while a signing secret is being rolled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: u64,
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, SignatureError> {
        if header.trim().is_empty() {
            return Err(SignatureError::MissingHeader);
        }

        let mut timestamp = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or(SignatureError::Malformed("expected key=value pairs"))?;

            match key {
                "t" => {
                    timestamp = Some(
                        value
                            .parse::<u64>()
                            .map_err(|_| SignatureError::Malformed("invalid timestamp"))?,
                    );
                }
                "v1" => {
                    // Undecodable entries can never match; skip them like other schemes.
                    if let Ok(sig) = hex::decode(value) {
                        v1_signatures.push(sig);
                    }
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SignatureError::Malformed("missing timestamp"))?;
        if v1_signatures.is_empty() {
            return Err(SignatureError::NoSignatures);
        }

        Ok(Self {
            timestamp,
            v1_signatures,
        })
    }
}

/// Verifier for Stripe webhook signatures.
#[derive(Clone)]
pub struct StripeWebhookVerifier {
    secret: String,
    max_age_seconds: u64,
}

impl StripeWebhookVerifier {
    /// Create a verifier. A `max_age_seconds` of 0 disables the timestamp check.
    pub fn new(secret: impl Into<String>, max_age_seconds: u64) -> Self {
        Self {
            secret: secret.into(),
            max_age_seconds,
        }
    }

    /// Verify `signature_header` against the exact request bytes.
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> Result<(), SignatureError> {
        self.verify_at(payload, signature_header, unix_now())
    }

    /// Verify against an explicit clock reading.
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: u64,
    ) -> Result<(), SignatureError> {
        let header = SignatureHeader::parse(signature_header)?;

        // Timestamps ahead of the local clock have age 0, as in Stripe's SDKs.
        let age = now.saturating_sub(header.timestamp);
        if self.max_age_seconds > 0 && age > self.max_age_seconds {
            warn!(
                webhook_time = header.timestamp,
                current_time = now,
                age_seconds = age,
                max_age_seconds = self.max_age_seconds,
                "stripe_signature_stale"
            );
            return Err(SignatureError::Stale {
                age_seconds: age,
                max_age_seconds: self.max_age_seconds,
            });
        }

        let expected = compute_signature(&self.secret, header.timestamp, payload);

        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| bool::from(expected.as_slice().ct_eq(candidate.as_slice())));

        if !matched {
            warn!(
                candidates = header.v1_signatures.len(),
                payload_length = payload.len(),
                "stripe_signature_mismatch"
            );
            return Err(SignatureError::Mismatch);
        }

        Ok(())
    }
}

/// HMAC-SHA256(secret, "{timestamp}." ++ payload).
///
/// The payload is fed as raw bytes; it is never decoded or re-encoded.
pub fn compute_signature(secret: &str, timestamp: u64, payload: &[u8]) -> Vec<u8> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Build a header value the way Stripe does. Used by tests and local tooling.
pub fn sign_payload(secret: &str, timestamp: u64, payload: &[u8]) -> String {
    format!(
        "t={},v1={}",
        timestamp,
        hex::encode(compute_signature(secret, timestamp, payload))
    )
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
