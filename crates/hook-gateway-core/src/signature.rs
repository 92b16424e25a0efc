//! HMAC-SHA256 signatures in GitHub's `X-Hub-Signature-256` format.
//!
//! Used twice: to verify inbound deliveries and to re-sign payloads that are
//! forwarded to tenant workspaces.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header value prefix
pub const SIGNATURE_PREFIX: &str = "sha256=";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("Signature must start with 'sha256='")]
    MissingPrefix,

    #[error("Invalid hex encoding in signature: {0}")]
    InvalidHex(String),

    #[error("Signature does not match payload")]
    Mismatch,

    #[error("Failed to create HMAC instance")]
    InvalidKey,
}

/// Compute the `sha256=<hex>` signature of `payload`.
pub fn sign(secret: &str, payload: &[u8]) -> Result<String, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(payload);
    Ok(format!(
        "{}{}",
        SIGNATURE_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Verify a `sha256=<hex>` header value against `payload`.
///
/// The comparison runs in constant time with respect to the signature bytes.
pub fn verify(secret: &str, payload: &[u8], header: &str) -> Result<(), SignatureError> {
    let provided = header
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or(SignatureError::MissingPrefix)?;
    let provided = hex::decode(provided).map_err(|e| SignatureError::InvalidHex(e.to_string()))?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(payload);
    let expected = mac.finalize().into_bytes();

    // Length is not secret
    if provided.len() != expected.len() {
        return Err(SignatureError::Mismatch);
    }

    if bool::from(provided.as_slice().ct_eq(expected.as_slice())) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
