// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! World ID cloud verification client.
//!
//! Proofs are checked by the developer portal; this client only shapes the
//! request and classifies the answer. Per-action usage limits are enforced
//! upstream and come back as rejection codes.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Zero-knowledge proof payload produced by the client widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofPayload {
    pub proof: String,
    pub merkle_root: String,
    pub nullifier_hash: String,
    pub verification_level: String,
}

/// Result of a cloud verification that reached the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Proof accepted; the nullifier is stable per human and action.
    Verified { nullifier_hash: String },
    /// Proof refused (invalid, replayed, over the action's limit, ...).
    Rejected {
        code: String,
        detail: String,
        attribute: Option<String>,
    },
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    nullifier_hash: &'a str,
    merkle_root: &'a str,
    proof: &'a str,
    verification_level: &'a str,
    action: &'a str,
    signal_hash: String,
}

#[derive(Deserialize)]
struct VerifySuccess {
    #[serde(default)]
    nullifier_hash: Option<String>,
}

#[derive(Deserialize, Default)]
struct VerifyFailure {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    attribute: Option<String>,
}

/// Client for `POST /api/v2/verify/{app_id}`.
#[derive(Clone)]
pub struct WorldIdService {
    http: reqwest::Client,
    base_url: String,
}

impl WorldIdService {
    /// Create a client against the given developer portal base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Verify a proof for `(app_id, action, signal)`.
    ///
    /// Semantic refusals come back as `VerifyOutcome::Rejected`; transport
    /// failures and server errors are `AppError::Upstream`.
    pub async fn verify(
        &self,
        app_id: &str,
        payload: &ProofPayload,
        action: &str,
        signal: &str,
    ) -> Result<VerifyOutcome, AppError> {
        let url = format!(
            "{}/api/v2/verify/{}",
            self.base_url,
            urlencoding::encode(app_id)
        );

        let body = VerifyRequest {
            nullifier_hash: &payload.nullifier_hash,
            merkle_root: &payload.merkle_root,
            proof: &payload.proof,
            verification_level: &payload.verification_level,
            action,
            signal_hash: hash_signal(signal),
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("World ID request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            let parsed: VerifySuccess = response
                .json()
                .await
                .map_err(|e| AppError::Upstream(format!("JSON parse error: {}", e)))?;
            return Ok(VerifyOutcome::Verified {
                nullifier_hash: parsed
                    .nullifier_hash
                    .unwrap_or_else(|| payload.nullifier_hash.clone()),
            });
        }

        if status.is_client_error() {
            let text = response.text().await.unwrap_or_default();
            let parsed: VerifyFailure = serde_json::from_str(&text).unwrap_or_default();
            return Ok(VerifyOutcome::Rejected {
                code: parsed.code.unwrap_or_else(|| "verification_failed".to_string()),
                detail: parsed.detail.unwrap_or(text),
                attribute: parsed.attribute,
            });
        }

        let text = response.text().await.unwrap_or_default();
        Err(AppError::Upstream(format!("HTTP {}: {}", status, text)))
    }
}

/// Normalize a configured app id to the `app_` form the cloud expects.
pub fn normalize_app_id(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("app_") {
        trimmed.to_string()
    } else {
        format!("app_{}", trimmed)
    }
}

/// Hash a signal the way the client widget does: `0x`-prefixed hex is
/// hashed as the bytes it encodes, anything else as UTF-8 text.
pub fn hash_signal(signal: &str) -> String {
    match signal_bytes(signal) {
        Some(bytes) => hash_to_field(&bytes),
        None => hash_to_field(signal.as_bytes()),
    }
}

fn signal_bytes(signal: &str) -> Option<Vec<u8>> {
    let digits = signal.strip_prefix("0x")?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    // Odd-length hex gets a leading zero nibble
    if digits.len() % 2 == 1 {
        hex::decode(format!("0{}", digits)).ok()
    } else {
        hex::decode(digits).ok()
    }
}

/// Hash arbitrary bytes into the proof system's field: keccak-256 shifted
/// right by 8 bits, as `0x` + 64 hex chars.
pub fn hash_to_field(input: &[u8]) -> String {
    let digest = Keccak256::digest(input);
    let mut field = [0u8; 32];
    field[1..].copy_from_slice(&digest[..31]);
    format!("0x{}", hex::encode(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_app_id() {
        assert_eq!(normalize_app_id("app_abc"), "app_abc");
        assert_eq!(normalize_app_id("  abc "), "app_abc");
        assert_eq!(normalize_app_id("app_staging_1"), "app_staging_1");
    }

    #[test]
    fn test_hash_to_field_empty_signal() {
        // keccak256("") = c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470
        assert_eq!(
            hash_to_field(b""),
            "0x00c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a4"
        );
    }

    #[test]
    fn test_hash_to_field_shape() {
        let hashed = hash_to_field(b"user-1");
        assert_eq!(hashed.len(), 66);
        assert!(hashed.starts_with("0x00"));
    }

    #[test]
    fn test_hex_signal_hashed_as_bytes() {
        let address = "0x11c8a1b5d7b1b3bc0adb8e20f7ee6f5ecc6d9aa1";
        let bytes = hex::decode(&address[2..]).unwrap();

        assert_eq!(hash_signal(address), hash_to_field(&bytes));
        assert_ne!(hash_signal(address), hash_to_field(address.as_bytes()));
        // Mixed-case checksummed addresses decode to the same bytes
        assert_eq!(
            hash_signal("0x11C8a1b5D7b1b3BC0AdB8E20F7eE6f5EcC6d9Aa1"),
            hash_to_field(&bytes)
        );
    }

    #[test]
    fn test_text_signal_hashed_as_utf8() {
        assert_eq!(hash_signal("user-1"), hash_to_field(b"user-1"));
        assert_eq!(hash_signal(""), hash_to_field(b""));
        assert_eq!(hash_signal("0xnothex"), hash_to_field(b"0xnothex"));
        assert_eq!(hash_signal("0x"), hash_to_field(b""));
        assert_eq!(hash_signal("0xabc"), hash_to_field(&[0x0a, 0xbc]));
    }
}
