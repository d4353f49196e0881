// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User sync and leaderboard routes.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{LeaderboardEntry, SyncUpdate, User};
use crate::AppState;

const DEFAULT_LEADERBOARD_LIMIT: u32 = 10;
const MAX_LEADERBOARD_LIMIT: u32 = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/user/sync", get(get_user).post(sync_user))
        .route("/api/leaderboard-db", get(get_leaderboard))
}

// ─── User Sync ───────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct SyncRequest {
    #[validate(length(min = 1, max = 64, message = "username must be 1-64 characters"))]
    username: String,
    #[serde(default)]
    xp: Option<u64>,
    #[serde(default)]
    #[validate(range(min = 1))]
    level: Option<u32>,
    #[serde(default)]
    streak: Option<u32>,
    #[serde(default)]
    total_calories: Option<u64>,
    #[serde(default)]
    entries_count: Option<u32>,
}

/// Create or update the user and return the stored record.
async fn sync_user(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<SyncRequest>, JsonRejection>,
) -> Result<Json<User>> {
    let Json(mut request) = body?;
    request.username = request.username.trim().to_string();
    request.validate()?;

    let update = SyncUpdate {
        xp: request.xp,
        level: request.level,
        streak: request.streak,
        total_calories: request.total_calories,
        entries_count: request.entries_count,
    };

    let user = state.db.sync_user(&request.username, &update).await?;

    tracing::debug!(
        username = %user.username,
        xp = user.xp,
        level = user.level,
        streak = user.streak,
        "User synced"
    );

    Ok(Json(user))
}

#[derive(Deserialize)]
struct UserQuery {
    username: Option<String>,
}

/// Read a user's current record.
async fn get_user(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<User>> {
    let Query(params) = query?;
    let username = params
        .username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing 'username' parameter".to_string()))?;

    let user = state
        .db
        .get_user(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;

    Ok(Json(user))
}

// ─── Leaderboard ─────────────────────────────────────────────

#[derive(Deserialize)]
struct LeaderboardQuery {
    limit: Option<u32>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
}

/// Top users ordered by rank.
async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<LeaderboardQuery>, QueryRejection>,
) -> Result<Json<LeaderboardResponse>> {
    let Query(params) = query?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .clamp(1, MAX_LEADERBOARD_LIMIT);

    let entries = state.db.leaderboard(limit).await?;

    Ok(Json(LeaderboardResponse { entries }))
}
