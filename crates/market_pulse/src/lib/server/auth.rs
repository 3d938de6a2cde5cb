//! Request authentication for the two webhook endpoints.
//!
//! Slack requests carry an HMAC-SHA256 signature over
//! `v0:{timestamp}:{raw body}`; the scheduler sends a shared secret in the
//! `X-Cron-Secret` header.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SLACK_TIMESTAMP_HEADER: &str = "X-Slack-Request-Timestamp";
pub const SLACK_SIGNATURE_HEADER: &str = "X-Slack-Signature";
pub const CRON_SECRET_HEADER: &str = "X-Cron-Secret";

/// Requests older or newer than this are replays.
pub const MAX_REQUEST_AGE_SECS: u64 = 60 * 5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing {0} header")]
    MissingHeader(&'static str),
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("Stale request: {age_secs}s old")]
    StaleRequest { age_secs: u64 },
    #[error("Signing secret not configured")]
    NotConfigured,
    #[error("Invalid signature")]
    InvalidSignature,
}

/// Checks a Slack request signature against the raw request body.
///
/// `now` is the current unix time in seconds.
pub fn verify_slack_signature(
    timestamp: Option<&str>,
    signature: Option<&str>,
    body: &[u8],
    signing_secret: &str,
    now: i64,
) -> Result<(), AuthError> {
    let timestamp = timestamp.ok_or(AuthError::MissingHeader(SLACK_TIMESTAMP_HEADER))?;
    let signature = signature.ok_or(AuthError::MissingHeader(SLACK_SIGNATURE_HEADER))?;

    let ts = timestamp
        .trim()
        .parse::<i64>()
        .map_err(|_| AuthError::InvalidTimestamp(timestamp.to_string()))?;

    let age_secs = now.abs_diff(ts);
    if age_secs > MAX_REQUEST_AGE_SECS {
        return Err(AuthError::StaleRequest { age_secs });
    }

    if signing_secret.is_empty() {
        return Err(AuthError::NotConfigured);
    }

    let expected = signature
        .strip_prefix("v0=")
        .and_then(|hex_sig| hex::decode(hex_sig).ok())
        .ok_or(AuthError::InvalidSignature)?;

    // constant time
    signing_mac(timestamp, body, signing_secret)?
        .verify_slice(&expected)
        .map_err(|_| AuthError::InvalidSignature)
}

fn signing_mac(timestamp: &str, body: &[u8], signing_secret: &str) -> Result<HmacSha256, AuthError> {
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .map_err(|_| AuthError::NotConfigured)?;
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Ok(mac)
}

/// Computes the `v0=` signature Slack would send for `body`.
pub fn slack_signature(
    timestamp: &str,
    body: &[u8],
    signing_secret: &str,
) -> Result<String, AuthError> {
    let mac = signing_mac(timestamp, body, signing_secret)?;
    Ok(format!("v0={}", hex::encode(mac.finalize().into_bytes())))
}

/// Checks the scheduler's shared secret.
///
/// An empty `expected` secret lets every request through and logs a warning.
pub fn verify_cron_secret(provided: Option<&str>, expected: &str) -> Result<(), AuthError> {
    if expected.is_empty() {
        tracing::warn!("CRON_SECRET not configured, skipping cron authentication");
        return Ok(());
    }

    let provided = provided.unwrap_or_default();
    if constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(AuthError::InvalidSignature)
    }
}

/// Byte comparison whose running time depends only on the lengths.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
