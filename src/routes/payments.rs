// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Payment initiation and confirmation routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::services::payments::is_failed;
use crate::services::PaymentService;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/initiate-payment", post(initiate_payment))
        .route("/api/confirm-payment", post(confirm_payment))
}

// ─── Initiation ──────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct InitiatePaymentRequest {
    #[validate(range(exclusive_min = 0.0, message = "amount must be positive"))]
    amount: f64,
    #[validate(length(min = 1, max = 256, message = "description must be 1-256 characters"))]
    description: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct InitiatePaymentResponse {
    pub id: String,
    pub amount: f64,
    pub description: String,
}

/// Hand out a payment reference for the client to pay against.
async fn initiate_payment(
    body: std::result::Result<Json<InitiatePaymentRequest>, JsonRejection>,
) -> Result<Json<InitiatePaymentResponse>> {
    let Json(mut request) = body?;
    request.description = request.description.trim().to_string();
    request.validate()?;

    // TODO: store the reference so confirmation can match it against the transaction
    let id = PaymentService::new_reference()?;

    tracing::info!(amount = request.amount, "Payment initiated");

    Ok(Json(InitiatePaymentResponse {
        id,
        amount: request.amount,
        description: request.description,
    }))
}

// ─── Confirmation ────────────────────────────────────────────

/// Result payload sent by the wallet after a payment attempt.
#[derive(Deserialize)]
pub struct PaymentResultPayload {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    transaction_id: Option<String>,
    #[serde(default)]
    reference: Option<String>,
}

#[derive(Deserialize)]
pub struct ConfirmPaymentRequest {
    #[serde(default)]
    payload: Option<PaymentResultPayload>,
}

#[derive(Serialize)]
pub struct ConfirmPaymentResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<serde_json::Value>,
}

impl ConfirmPaymentResponse {
    fn failure(transaction: Option<serde_json::Value>) -> Json<Self> {
        Json(Self {
            success: false,
            transaction,
        })
    }
}

/// Look the transaction up upstream and report whether it went through.
async fn confirm_payment(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<ConfirmPaymentRequest>, JsonRejection>,
) -> Result<Json<ConfirmPaymentResponse>> {
    let Json(request) = body?;
    let payload = request
        .payload
        .ok_or_else(|| AppError::BadRequest("Missing payload".to_string()))?;

    if payload.status.as_deref() == Some("error") {
        tracing::info!(reference = ?payload.reference, "Wallet reported payment error");
        return Ok(ConfirmPaymentResponse::failure(None));
    }

    let transaction_id = payload
        .transaction_id
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing transaction_id".to_string()))?;

    let app_id = state
        .config
        .app_id
        .as_deref()
        .map(crate::services::world_id::normalize_app_id)
        .ok_or_else(|| AppError::Config("APP_ID is not configured".to_string()))?;
    let api_key = state
        .config
        .dev_portal_api_key
        .as_deref()
        .ok_or_else(|| AppError::Config("DEV_PORTAL_API_KEY is not configured".to_string()))?;

    let transaction = match state
        .payments
        .get_transaction(&app_id, api_key, &transaction_id)
        .await
    {
        Ok(transaction) => transaction,
        Err(e) => {
            tracing::warn!(transaction_id = %transaction_id, error = %e, "Transaction lookup failed");
            return Ok(ConfirmPaymentResponse::failure(None));
        }
    };

    if is_failed(&transaction) {
        tracing::info!(transaction_id = %transaction_id, "Payment failed upstream");
        return Ok(ConfirmPaymentResponse::failure(Some(transaction)));
    }

    tracing::info!(transaction_id = %transaction_id, "Payment confirmed");

    Ok(Json(ConfirmPaymentResponse {
        success: true,
        transaction: Some(transaction),
    }))
}
