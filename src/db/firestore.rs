// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User store with typed operations.
//!
//! Provides:
//! - Users (profile + gamification counters, keyed by username)
//! - Leaderboard (top-N users in ranking order)
//!
//! Backed by Firestore in deployment. The in-memory backend serves local
//! runs and tests; the offline mock fails every call.

use crate::db::collections;
use crate::error::AppError;
use crate::models::leaderboard::rank_users;
use crate::models::{LeaderboardEntry, SyncUpdate, User};
use dashmap::DashMap;
use firestore::FirestoreQueryDirection;
use std::sync::Arc;

/// Attempts before a contended user sync gives up.
const MAX_SYNC_ATTEMPTS: u32 = 5;

/// Query ordering matching `rank_users`, so the limit cuts at the same row
/// on every backend.
const LEADERBOARD_ORDER: [(&str, FirestoreQueryDirection); 4] = [
    ("xp", FirestoreQueryDirection::Descending),
    ("level", FirestoreQueryDirection::Descending),
    ("created_at", FirestoreQueryDirection::Ascending),
    ("username", FirestoreQueryDirection::Ascending),
];

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(Arc<DashMap<String, User>>),
    Offline,
}

/// User store client.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // Emulator connections skip real credentials entirely
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create an in-memory store. Data lives as long as the process.
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(DashMap::new())),
        }
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    fn offline() -> AppError {
        AppError::Database("Database not connected (offline mode)".to_string())
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by username.
    pub async fn get_user(&self, username: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::USERS)
                .obj()
                .one(&document_id(username))
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(users) => Ok(users.get(username).map(|u| u.value().clone())),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Create the user if absent, otherwise merge the update into it.
    ///
    /// Returns the stored record after the write.
    pub async fn sync_user(&self, username: &str, update: &SyncUpdate) -> Result<User, AppError> {
        let now = crate::time_utils::format_utc_rfc3339(chrono::Utc::now());

        match &self.backend {
            Backend::Firestore(client) => {
                for attempt in 1..=MAX_SYNC_ATTEMPTS {
                    let synced =
                        Self::sync_in_transaction(client, username, update, &now).await?;
                    if let Some(user) = synced {
                        return Ok(user);
                    }
                    tracing::warn!(username, attempt, "User sync transaction aborted, retrying");
                }
                Err(AppError::Database(format!(
                    "User sync for {} still conflicting after {} attempts",
                    username, MAX_SYNC_ATTEMPTS
                )))
            }
            Backend::Memory(users) => {
                let entry = users
                    .entry(username.to_string())
                    .and_modify(|user| user.merge(update, &now))
                    .or_insert_with(|| {
                        tracing::info!(username, "Creating user");
                        User::new(username, update, &now)
                    });
                Ok(entry.value().clone())
            }
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// One read-merge-write attempt. The read goes through the transaction
    /// so a concurrent write to the same user aborts the commit.
    ///
    /// Returns `None` when the commit was rejected and the caller should retry.
    async fn sync_in_transaction(
        client: &firestore::FirestoreDb,
        username: &str,
        update: &SyncUpdate,
        now: &str,
    ) -> Result<Option<User>, AppError> {
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let tx_client = client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        );

        let existing: Option<User> = tx_client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&document_id(username))
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read user in transaction: {}", e))
            })?;

        let user = match existing {
            Some(mut user) => {
                user.merge(update, now);
                user
            }
            None => {
                tracing::info!(username, "Creating user");
                User::new(username, update, now)
            }
        };

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(document_id(username))
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add user to transaction: {}", e))
            })?;

        match transaction.commit().await {
            Ok(_) => Ok(Some(user)),
            Err(e) => {
                tracing::debug!(username, error = %e, "Transaction commit failed");
                Ok(None)
            }
        }
    }

    // ─── Leaderboard ─────────────────────────────────────────────

    /// Top `limit` users in ranking order.
    pub async fn leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, AppError> {
        let users: Vec<User> = match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collections::USERS)
                .order_by(LEADERBOARD_ORDER)
                .limit(limit)
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
            Backend::Memory(users) => users.iter().map(|u| u.value().clone()).collect(),
            Backend::Offline => return Err(Self::offline()),
        };

        Ok(rank_users(users, limit as usize))
    }
}

/// Firestore document IDs cannot contain `/`, so usernames are URL-encoded.
fn document_id(username: &str) -> String {
    urlencoding::encode(username).into_owned()
}
