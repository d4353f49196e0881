// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use calorie_quest::error::AppError;
use serde_json::json;

mod common;

async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    (status, common::json_body(response).await)
}

#[tokio::test]
async fn test_sign_in_failures_share_shape() {
    let (status, body) = render(AppError::InvalidNonce).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "status": "error", "isValid": false, "message": "Invalid nonce" })
    );

    // The reason is logged, never returned
    let (status, body) = render(AppError::InvalidSignature("expired".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "status": "error", "isValid": false, "message": "Invalid signature" })
    );
}

#[tokio::test]
async fn test_proof_rejection_shape() {
    let (status, body) = render(AppError::ProofRejected {
        code: "invalid_proof".to_string(),
        detail: "The provided proof is invalid.".to_string(),
        attribute: Some("proof".to_string()),
    })
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "success": false,
            "verified": false,
            "code": "invalid_proof",
            "detail": "The provided proof is invalid.",
            "attribute": "proof"
        })
    );
}

#[tokio::test]
async fn test_server_errors_hide_details() {
    for (err, code) in [
        (AppError::Config("APP_ID".to_string()), "config_error"),
        (AppError::Upstream("HTTP 502".to_string()), "upstream_error"),
        (AppError::Database("timeout".to_string()), "database_error"),
        (
            AppError::Internal(anyhow::anyhow!("randomness")),
            "internal_error",
        ),
    ] {
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": code }));
    }
}

#[tokio::test]
async fn test_client_errors_carry_details() {
    let (status, body) = render(AppError::BadRequest("Missing action".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "error": "bad_request", "details": "Missing action" })
    );

    let (status, body) = render(AppError::NotFound("User x not found".to_string())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_query_rejection_is_bad_request() {
    use axum::extract::{FromRequestParts, Query};
    use axum::http::Request;

    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct Params {
        limit: u32,
    }

    let (mut parts, _) = Request::builder()
        .uri("/?limit=many")
        .body(())
        .unwrap()
        .into_parts();
    let rejection = Query::<Params>::from_request_parts(&mut parts, &())
        .await
        .unwrap_err();

    let (status, body) = render(AppError::from(rejection)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert!(body["details"].is_string());
}
