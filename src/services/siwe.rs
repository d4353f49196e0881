// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in with Ethereum (EIP-4361) message checks and signature verification.
//!
//! Handles:
//! - Parsing the plain-text SIWE message signed by the wallet
//! - Nonce, address and validity-window checks
//! - ECDSA recovery for externally owned accounts
//! - ERC-1271 `isValidSignature` via JSON-RPC for smart-contract wallets

use chrono::{DateTime, Utc};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::time::Duration;

use crate::time_utils::parse_rfc3339_utc;

/// `isValidSignature(bytes32,bytes)` selector and its success return value.
const ERC1271_MAGIC: [u8; 4] = [0x16, 0x26, 0xba, 0x7e];

const HEADER_SUFFIX: &str = " wants you to sign in with your Ethereum account:";
const RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Wallet auth payload posted by the client after signing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiwePayload {
    pub status: String,
    pub message: String,
    pub signature: String,
    pub address: String,
    #[serde(default)]
    pub version: Option<u32>,
}

/// Parsed EIP-4361 message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiweMessage {
    pub domain: String,
    pub address: String,
    pub statement: Option<String>,
    pub uri: String,
    pub version: String,
    pub chain_id: u64,
    pub nonce: String,
    pub issued_at: String,
    pub expiration_time: Option<String>,
    pub not_before: Option<String>,
    pub request_id: Option<String>,
    pub resources: Vec<String>,
}

/// Reasons a sign-in attempt is refused.
#[derive(Debug, thiserror::Error)]
pub enum SiweError {
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("message nonce does not match")]
    NonceMismatch,

    #[error("message address does not match payload address")]
    AddressMismatch,

    #[error("message expired")]
    Expired,

    #[error("message not yet valid")]
    NotYetValid,

    #[error("signature does not match address")]
    BadSignature,

    #[error("RPC failure: {0}")]
    Rpc(String),
}

impl SiweMessage {
    /// Parse the plain-text message format.
    pub fn parse(raw: &str) -> Result<Self, SiweError> {
        let malformed = |what: &str| SiweError::Malformed(what.to_string());
        let mut lines = raw.lines();

        let domain = lines
            .next()
            .and_then(|l| l.strip_suffix(HEADER_SUFFIX))
            .filter(|d| !d.is_empty())
            .ok_or_else(|| malformed("header"))?
            .to_string();

        let address = lines
            .next()
            .map(str::trim)
            .filter(|a| is_address(a))
            .ok_or_else(|| malformed("address"))?
            .to_string();

        let mut statement = None;
        let mut uri = None;
        let mut version = None;
        let mut chain_id = None;
        let mut nonce = None;
        let mut issued_at = None;
        let mut expiration_time = None;
        let mut not_before = None;
        let mut request_id = None;
        let mut resources = Vec::new();
        let mut in_resources = false;

        for line in lines {
            if in_resources {
                match line.strip_prefix("- ") {
                    Some(resource) => {
                        resources.push(resource.to_string());
                        continue;
                    }
                    None => in_resources = false,
                }
            }

            if line.trim().is_empty() {
                continue;
            }

            if line == "Resources:" {
                in_resources = true;
                continue;
            }

            match line.split_once(": ") {
                Some(("URI", v)) => uri = Some(v.to_string()),
                Some(("Version", v)) => version = Some(v.to_string()),
                Some(("Chain ID", v)) => {
                    chain_id = Some(v.trim().parse::<u64>().map_err(|_| malformed("chain id"))?)
                }
                Some(("Nonce", v)) => nonce = Some(v.to_string()),
                Some(("Issued At", v)) => issued_at = Some(v.to_string()),
                Some(("Expiration Time", v)) => expiration_time = Some(v.to_string()),
                Some(("Not Before", v)) => not_before = Some(v.to_string()),
                Some(("Request ID", v)) => request_id = Some(v.to_string()),
                _ if uri.is_none() && statement.is_none() => statement = Some(line.to_string()),
                _ => return Err(malformed("unexpected line")),
            }
        }

        let nonce = nonce.ok_or_else(|| malformed("nonce"))?;
        if nonce.len() < 8 || !nonce.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(malformed("nonce"));
        }

        Ok(Self {
            domain,
            address,
            statement,
            uri: uri.ok_or_else(|| malformed("uri"))?,
            version: version.ok_or_else(|| malformed("version"))?,
            chain_id: chain_id.ok_or_else(|| malformed("chain id"))?,
            nonce,
            issued_at: issued_at.ok_or_else(|| malformed("issued at"))?,
            expiration_time,
            not_before,
            request_id,
            resources,
        })
    }

    /// Check nonce, address and validity window against the request.
    pub fn validate(
        &self,
        expected_nonce: &str,
        expected_address: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SiweError> {
        if self.nonce != expected_nonce {
            return Err(SiweError::NonceMismatch);
        }
        if !self.address.eq_ignore_ascii_case(expected_address.trim()) {
            return Err(SiweError::AddressMismatch);
        }
        if let Some(raw) = &self.expiration_time {
            let expires = parse_rfc3339_utc(raw)
                .ok_or_else(|| SiweError::Malformed("expiration time".to_string()))?;
            if now >= expires {
                return Err(SiweError::Expired);
            }
        }
        if let Some(raw) = &self.not_before {
            let not_before = parse_rfc3339_utc(raw)
                .ok_or_else(|| SiweError::Malformed("not before".to_string()))?;
            if now < not_before {
                return Err(SiweError::NotYetValid);
            }
        }
        Ok(())
    }
}

/// Verifies wallet signatures, calling out to the chain for contract wallets.
#[derive(Clone)]
pub struct SiweVerifier {
    http: reqwest::Client,
    rpc_url: String,
}

impl SiweVerifier {
    /// Create a verifier that uses the given JSON-RPC endpoint.
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(RPC_TIMEOUT)
                .build()
                .unwrap_or_default(),
            rpc_url: rpc_url.into(),
        }
    }

    /// Verify a signed sign-in payload against the issued nonce.
    ///
    /// Returns the parsed message on success.
    pub async fn verify(
        &self,
        payload: &SiwePayload,
        nonce: &str,
        now: DateTime<Utc>,
    ) -> Result<SiweMessage, SiweError> {
        let message = SiweMessage::parse(&payload.message)?;
        message.validate(nonce, &payload.address, now)?;

        let signature = decode_hex(&payload.signature)
            .ok_or_else(|| SiweError::Malformed("signature".to_string()))?;
        let hash = eip191_hash(&payload.message);

        if let Some(recovered) = recover_address(&hash, &signature) {
            if recovered.eq_ignore_ascii_case(&message.address) {
                return Ok(message);
            }
        }

        // Not an EOA signature for this address; ask the wallet contract
        if self
            .is_valid_contract_signature(&message.address, &hash, &signature)
            .await?
        {
            Ok(message)
        } else {
            Err(SiweError::BadSignature)
        }
    }

    /// ERC-1271 check via `eth_call`.
    ///
    /// RPC-level errors (reverts, no code at the address) count as an
    /// invalid signature; transport failures are errors.
    async fn is_valid_contract_signature(
        &self,
        address: &str,
        hash: &[u8; 32],
        signature: &[u8],
    ) -> Result<bool, SiweError> {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [
                { "to": address, "data": encode_is_valid_signature(hash, signature) },
                "latest"
            ]
        });

        let response = self
            .http
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SiweError::Rpc(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SiweError::Rpc(format!("HTTP {}", response.status())));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| SiweError::Rpc(format!("JSON parse error: {}", e)))?;

        if let Some(error) = body.error {
            tracing::debug!(code = error.code, message = %error.message, "isValidSignature call failed");
            return Ok(false);
        }

        Ok(body
            .result
            .as_deref()
            .and_then(decode_hex)
            .map(|ret| ret.len() >= 4 && ret[..4] == ERC1271_MAGIC)
            .unwrap_or(false))
    }
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Keccak-256 digest.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// EIP-191 personal message hash.
pub fn eip191_hash(message: &str) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(format!("\x19Ethereum Signed Message:\n{}", message.len()).as_bytes());
    hasher.update(message.as_bytes());
    hasher.finalize().into()
}

/// Recover the signer address from a 65-byte `r || s || v` signature.
pub fn recover_address(hash: &[u8; 32], signature: &[u8]) -> Option<String> {
    if signature.len() != 65 {
        return None;
    }
    let sig = Signature::from_slice(&signature[..64]).ok()?;
    let v = match signature[64] {
        v @ (27 | 28) => v - 27,
        v @ (0 | 1) => v,
        _ => return None,
    };
    let recovery_id = RecoveryId::from_byte(v)?;
    let key = VerifyingKey::recover_from_prehash(hash, &sig, recovery_id).ok()?;
    Some(address_of(&key))
}

/// Checksum-free `0x` address of a public key.
pub fn address_of(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&digest[12..]))
}

/// ABI-encode `isValidSignature(bytes32 hash, bytes signature)` call data.
fn encode_is_valid_signature(hash: &[u8; 32], signature: &[u8]) -> String {
    let padded_len = signature.len().div_ceil(32) * 32;
    let mut data = Vec::with_capacity(4 + 32 * 3 + padded_len);
    data.extend_from_slice(&ERC1271_MAGIC);
    data.extend_from_slice(hash);
    data.extend_from_slice(&abi_word(64));
    data.extend_from_slice(&abi_word(signature.len() as u64));
    data.extend_from_slice(signature);
    data.resize(4 + 32 * 3 + padded_len, 0);
    format!("0x{}", hex::encode(data))
}

fn abi_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

fn decode_hex(raw: &str) -> Option<Vec<u8>> {
    let trimmed = raw.trim();
    hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed)).ok()
}

fn is_address(raw: &str) -> bool {
    raw.strip_prefix("0x")
        .map(|h| h.len() == 40 && h.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}
