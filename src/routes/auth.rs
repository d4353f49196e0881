// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wallet sign-in routes: nonce issuing and SIWE completion.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::services::nonce::{
    consumed_nonce_cookie, generate_nonce, nonce_cookie, nonce_matches, NONCE_COOKIE,
};
use crate::services::{SiweError, SiwePayload};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/nonce", get(issue_nonce))
        .route("/api/complete-siwe", post(complete_siwe))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NonceResponse {
    pub nonce: String,
}

/// Issue a nonce and remember it in the `siwe` cookie.
async fn issue_nonce(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<NonceResponse>)> {
    let nonce = generate_nonce()?;
    let jar = jar.add(nonce_cookie(nonce.clone(), state.config.production));

    tracing::debug!("Issued sign-in nonce");

    Ok((jar, Json(NonceResponse { nonce })))
}

/// Sign-in completion request. The payload stays untyped until the nonce
/// has been checked.
#[derive(Deserialize)]
pub struct CompleteSiweRequest {
    #[serde(default)]
    payload: Option<serde_json::Value>,
    #[serde(default)]
    nonce: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompleteSiweResponse {
    pub status: String,
    pub is_valid: bool,
}

/// Verify a signed SIWE message against the nonce issued to this browser.
async fn complete_siwe(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: std::result::Result<Json<CompleteSiweRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<CompleteSiweResponse>)> {
    let Json(request) = body?;

    let stored = jar
        .get(NONCE_COOKIE)
        .map(|c| c.value().to_string())
        .unwrap_or_default();
    let submitted = request.nonce.unwrap_or_default();

    if !nonce_matches(&stored, &submitted) {
        tracing::info!(has_cookie = !stored.is_empty(), "Sign-in nonce mismatch");
        return Err(AppError::InvalidNonce);
    }

    let payload: SiwePayload = request
        .payload
        .ok_or_else(|| AppError::BadRequest("Missing payload".to_string()))
        .and_then(|raw| {
            serde_json::from_value(raw)
                .map_err(|e| AppError::BadRequest(format!("Invalid payload: {}", e)))
        })?;

    if payload.status != "success" {
        return Err(AppError::BadRequest(format!(
            "Wallet auth status was '{}'",
            payload.status
        )));
    }

    state
        .siwe_verifier
        .verify(&payload, &submitted, chrono::Utc::now())
        .await
        .map_err(|err| match err {
            SiweError::NonceMismatch => AppError::InvalidNonce,
            SiweError::Rpc(reason) => AppError::Upstream(reason),
            other => AppError::InvalidSignature(other.to_string()),
        })?;

    tracing::info!("Sign-in completed");

    // Nonce is single use
    let jar = jar.remove(consumed_nonce_cookie(state.config.production));

    Ok((
        jar,
        Json(CompleteSiweResponse {
            status: "success".to_string(),
            is_valid: true,
        }),
    ))
}
