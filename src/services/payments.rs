// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Payment reference issuing and transaction lookup against the host's
//! payment API.
//!
//! Nothing here is persisted: references are handed to the client and
//! confirmations are reported straight back.

use crate::error::AppError;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const REFERENCE_BYTES: usize = 16;

/// Upstream transaction status that marks a payment as failed.
pub const FAILED_STATUS: &str = "failed";

/// Payment API client.
#[derive(Clone)]
pub struct PaymentService {
    http: reqwest::Client,
    base_url: String,
}

impl PaymentService {
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

    /// New random payment reference (32 hex chars).
    pub fn new_reference() -> anyhow::Result<String> {
        crate::services::nonce::random_hex(REFERENCE_BYTES)
    }

    /// Look up a transaction by id. Returns the raw upstream JSON.
    pub async fn get_transaction(
        &self,
        app_id: &str,
        api_key: &str,
        transaction_id: &str,
    ) -> Result<serde_json::Value, AppError> {
        let url = format!(
            "{}/api/v2/minikit/transaction/{}",
            self.base_url,
            urlencoding::encode(transaction_id)
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(api_key)
            .query(&[("app_id", app_id), ("type", "payment")])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Transaction lookup failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("JSON parse error: {}", e)))
    }
}

/// True when the upstream transaction reports the failed status.
pub fn is_failed(transaction: &serde_json::Value) -> bool {
    transaction
        .get("transaction_status")
        .and_then(|s| s.as_str())
        .map(|s| s == FAILED_STATUS)
        .unwrap_or(false)
}
