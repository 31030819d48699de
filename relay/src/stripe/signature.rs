//! Stripe webhook signature verification.
//!
//! Stripe signs webhook requests using HMAC-SHA256.
//! Reference: https://docs.stripe.com/webhooks#verify-manually

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::warn;

use super::event::InboundEvent;

type HmacSha256 = Hmac<Sha256>;

/// Name of the header carrying the signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Why a webhook body was not accepted.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("signature header is malformed")]
    MalformedHeader,

    #[error("signature header has no v1 signatures")]
    NoSignatures,

    #[error("timestamp is {age_secs}s old, tolerance is {tolerance_secs}s")]
    TimestampExpired { age_secs: u64, tolerance_secs: u64 },

    #[error("no signature matches the expected signature")]
    SignatureMismatch,

    #[error("payload is not a valid event: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Turns a signed webhook body into an [`InboundEvent`].
pub trait EventVerifier: Send + Sync {
    fn verify(
        &self,
        payload: &[u8],
        signature: &str,
        secret: &str,
    ) -> Result<InboundEvent, VerificationError>;
}

/// Verifies the `Stripe-Signature` scheme: `t=<unix>,v1=<hex>[,v1=<hex>...]`.
#[derive(Debug, Clone)]
pub struct StripeVerifier {
    tolerance: Duration,
}

impl StripeVerifier {
    pub fn new(tolerance: Duration) -> Self {
        Self { tolerance }
    }

    fn verify_at(
        &self,
        payload: &[u8],
        signature: &str,
        secret: &str,
        now: u64,
    ) -> Result<InboundEvent, VerificationError> {
        let header = SignatureHeader::parse(signature)?;

        if header.signatures.is_empty() {
            warn!(timestamp = header.timestamp, "stripe_signature_missing_v1");
            return Err(VerificationError::NoSignatures);
        }

        let expected = compute_signature(secret, header.timestamp, payload);

        let matched = header
            .signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate));

        if !matched {
            warn!(
                candidates = header.signatures.len(),
                "stripe_signature_mismatch"
            );
            return Err(VerificationError::SignatureMismatch);
        }

        // Timestamps in the future are accepted, only stale ones are refused.
        let age = now.saturating_sub(header.timestamp);
        if age > self.tolerance.as_secs() {
            warn!(
                webhook_time = header.timestamp,
                current_time = now,
                age_seconds = age,
                max_age_seconds = self.tolerance.as_secs(),
                "stripe_signature_stale"
            );
            return Err(VerificationError::TimestampExpired {
                age_secs: age,
                tolerance_secs: self.tolerance.as_secs(),
            });
        }

        InboundEvent::from_json(payload).map_err(|e| {
            warn!(error = %e, "stripe_event_payload_invalid");
            VerificationError::from(e)
        })
    }
}

impl EventVerifier for StripeVerifier {
    fn verify(
        &self,
        payload: &[u8],
        signature: &str,
        secret: &str,
    ) -> Result<InboundEvent, VerificationError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        self.verify_at(payload, signature, secret, now)
    }
}

/// Parsed form of the `Stripe-Signature` header.
#[derive(Debug, PartialEq, Eq)]
struct SignatureHeader {
    timestamp: u64,
    signatures: Vec<String>,
}

impl SignatureHeader {
    fn parse(raw: &str) -> Result<Self, VerificationError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for pair in raw.split(',') {
            let Some((key, value)) = pair.trim().split_once('=') else {
                warn!(pair = %pair, "stripe_signature_bad_pair");
                return Err(VerificationError::MalformedHeader);
            };

            match key {
                "t" => {
                    let parsed = value
                        .parse::<u64>()
                        .map_err(|_| VerificationError::MalformedHeader)?;
                    timestamp = Some(parsed);
                }
                "v1" => signatures.push(value.to_string()),
                // v0 and future schemes are ignored
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            warn!("stripe_signature_missing_timestamp");
            VerificationError::MalformedHeader
        })?;

        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

/// Compute the hex HMAC-SHA256 of `"{timestamp}.{payload}"`.
pub fn compute_signature(secret: &str, timestamp: u64, payload: &[u8]) -> String {
    // HMAC takes keys of any length, so this never fails.
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");

    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
