// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Payment initiation and confirmation.

use axum::{
    body::Body,
    extract::{Path, Query},
    http::{header, HeaderMap, Request, StatusCode},
    routing::get,
    Json, Router,
};
use calorie_quest::config::Config;
use serde_json::json;
use std::collections::HashMap;
use tower::ServiceExt;

mod common;

fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn confirm_body(transaction_id: &str) -> serde_json::Value {
    json!({
        "payload": {
            "status": "success",
            "transaction_id": transaction_id,
            "reference": "0123456789abcdef0123456789abcdef"
        }
    })
}

/// Developer portal stub that reports `status` for every transaction.
async fn app_with_portal(status: &'static str) -> axum::Router {
    let portal = Router::new().route(
        "/api/v2/minikit/transaction/{id}",
        get(
            move |Path(id): Path<String>,
                  Query(params): Query<HashMap<String, String>>,
                  headers: HeaderMap| async move {
                if headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok())
                    != Some("Bearer test_api_key")
                {
                    return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" })));
                }
                assert_eq!(params.get("app_id").map(String::as_str), Some("app_staging_test"));
                assert_eq!(params.get("type").map(String::as_str), Some("payment"));
                (
                    StatusCode::OK,
                    Json(json!({
                        "transaction_id": id,
                        "transaction_status": status,
                        "reference": "0123456789abcdef0123456789abcdef"
                    })),
                )
            },
        ),
    );
    let mut config = Config::test_default();
    config.developer_api_url = common::spawn_upstream(portal).await;
    common::create_test_app(config).0
}

#[tokio::test]
async fn test_initiate_payment() {
    let (app, _) = common::create_test_app(Config::test_default());

    let response = app
        .oneshot(post(
            "/api/initiate-payment",
            json!({ "amount": 0.5, "description": " Premium meal plan " }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    let id = body["id"].as_str().unwrap();
    assert_eq!(id.len(), 32);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(body["amount"], 0.5);
    assert_eq!(body["description"], "Premium meal plan");
}

#[tokio::test]
async fn test_initiate_payment_references_are_unique() {
    let (app, _) = common::create_test_app(Config::test_default());
    let body = json!({ "amount": 1.0, "description": "Tip" });

    let first = common::json_body(
        app.clone()
            .oneshot(post("/api/initiate-payment", body.clone()))
            .await
            .unwrap(),
    )
    .await;
    let second = common::json_body(
        app.oneshot(post("/api/initiate-payment", body)).await.unwrap(),
    )
    .await;

    assert_ne!(first["id"], second["id"]);
}

#[tokio::test]
async fn test_initiate_payment_validation() {
    let (app, _) = common::create_test_app(Config::test_default());

    for body in [
        json!({ "amount": 0, "description": "Tip" }),
        json!({ "amount": -1, "description": "Tip" }),
        json!({ "amount": 1, "description": "   " }),
        json!({ "description": "Tip" }),
    ] {
        let response = app
            .clone()
            .oneshot(post("/api/initiate-payment", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_confirm_mined_payment() {
    let app = app_with_portal("mined").await;

    let response = app
        .oneshot(post("/api/confirm-payment", confirm_body("tx-123")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["transaction"]["transaction_id"], "tx-123");
}

#[tokio::test]
async fn test_confirm_failed_payment() {
    let app = app_with_portal("failed").await;

    let response = app
        .oneshot(post("/api/confirm-payment", confirm_body("tx-456")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["transaction"]["transaction_status"], "failed");
}

#[tokio::test]
async fn test_confirm_wallet_error_skips_lookup() {
    // No portal reachable: the lookup must not happen
    let (app, _) = common::create_test_app(Config::test_default());

    let response = app
        .oneshot(post(
            "/api/confirm-payment",
            json!({ "payload": { "status": "error", "error_code": "user_rejected" } }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::json_body(response).await, json!({ "success": false }));
}

#[tokio::test]
async fn test_confirm_upstream_failure() {
    let (app, _) = common::create_test_app(Config::test_default());

    let response = app
        .oneshot(post("/api/confirm-payment", confirm_body("tx-789")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::json_body(response).await, json!({ "success": false }));
}

#[tokio::test]
async fn test_confirm_requires_transaction_id() {
    let (app, _) = common::create_test_app(Config::test_default());

    let response = app
        .clone()
        .oneshot(post(
            "/api/confirm-payment",
            json!({ "payload": { "status": "success" } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(post("/api/confirm-payment", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_confirm_requires_api_key() {
    let mut config = Config::test_default();
    config.dev_portal_api_key = None;
    let (app, _) = common::create_test_app(config);

    let response = app
        .oneshot(post("/api/confirm-payment", confirm_body("tx-1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
