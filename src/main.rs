// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calorie Quest API Server
//!
//! Backend for the calorie tracking mini-app: sign-in, proof-of-personhood,
//! user sync, leaderboard and payments.

use calorie_quest::{
    config::{Config, DatabaseBackend},
    db::FirestoreDb,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Structured JSON logging
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        production = config.production,
        "Starting Calorie Quest API"
    );

    if config.app_id.is_none() {
        tracing::warn!("APP_ID not set; proof verification will fail");
    }
    if config.dev_portal_api_key.is_none() {
        tracing::warn!("DEV_PORTAL_API_KEY not set; payment confirmation will fail");
    }

    let db = match config.database_backend {
        DatabaseBackend::Firestore => FirestoreDb::new(&config.gcp_project_id).await?,
        DatabaseBackend::Memory => {
            tracing::warn!("Using in-memory user store; data is lost on restart");
            FirestoreDb::new_in_memory()
        }
    };

    let state = Arc::new(AppState::new(config.clone(), db));

    let app = calorie_quest::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("calorie_quest=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
