// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Proof-of-personhood verification route.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::services::world_id::normalize_app_id;
use crate::services::{ProofPayload, VerifyOutcome};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/world-id/verify", post(verify_proof))
}

#[derive(Deserialize)]
pub struct VerifyProofRequest {
    #[serde(default)]
    payload: Option<ProofPayload>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    signal: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VerifyProofResponse {
    pub success: bool,
    pub verified: bool,
    pub nullifier_hash: String,
}

/// Forward a World ID proof to the verification cloud.
async fn verify_proof(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<VerifyProofRequest>, JsonRejection>,
) -> Result<Json<VerifyProofResponse>> {
    let Json(request) = body?;

    let payload = request
        .payload
        .ok_or_else(|| AppError::BadRequest("Missing payload".to_string()))?;
    // The proof commits to the exact action string, so it is forwarded as sent
    let action = request
        .action
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing action".to_string()))?;

    let app_id = state
        .config
        .app_id
        .as_deref()
        .map(normalize_app_id)
        .ok_or_else(|| AppError::Config("APP_ID is not configured".to_string()))?;

    let signal = request
        .signal
        .or_else(|| state.config.world_id_signal.clone())
        .unwrap_or_default();

    tracing::debug!(action = %action, level = %payload.verification_level, "Verifying proof");

    match state
        .world_id
        .verify(&app_id, &payload, &action, &signal)
        .await?
    {
        VerifyOutcome::Verified { nullifier_hash } => {
            tracing::info!(action = %action, "Proof verified");
            Ok(Json(VerifyProofResponse {
                success: true,
                verified: true,
                nullifier_hash,
            }))
        }
        VerifyOutcome::Rejected {
            code,
            detail,
            attribute,
        } => {
            tracing::info!(action = %action, code = %code, "Proof rejected");
            Err(AppError::ProofRejected {
                code,
                detail,
                attribute,
            })
        }
    }
}
