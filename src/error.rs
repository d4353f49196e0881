// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server misconfigured: {0}")]
    Config(String),

    #[error("Invalid nonce")]
    InvalidNonce,

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Proof rejected: {code}")]
    ProofRejected {
        code: String,
        detail: String,
        attribute: Option<String>,
    },

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// Body returned by the sign-in handshake on failure.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SiweErrorResponse {
    status: &'static str,
    is_valid: bool,
    message: &'static str,
}

/// Body returned when the verification cloud rejects a proof.
#[derive(Serialize)]
struct ProofErrorResponse<'a> {
    success: bool,
    verified: bool,
    code: &'a str,
    detail: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attribute: Option<&'a str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::Config(msg) => {
                tracing::error!(error = %msg, "Configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
            AppError::InvalidNonce => return siwe_failure("Invalid nonce"),
            AppError::InvalidSignature(reason) => {
                tracing::info!(reason = %reason, "Rejected sign-in signature");
                return siwe_failure("Invalid signature");
            }
            AppError::ProofRejected {
                code,
                detail,
                attribute,
            } => {
                let body = ProofErrorResponse {
                    success: false,
                    verified: false,
                    code,
                    detail,
                    attribute: attribute.as_deref(),
                };
                return (StatusCode::BAD_REQUEST, Json(body)).into_response();
            }
            AppError::Upstream(msg) => {
                tracing::error!(error = %msg, "Upstream service error");
                (StatusCode::INTERNAL_SERVER_ERROR, "upstream_error", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Malformed or missing JSON bodies are plain validation errors.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

fn siwe_failure(message: &'static str) -> Response {
    let body = SiweErrorResponse {
        status: "error",
        is_valid: false,
        message,
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
