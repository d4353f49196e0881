// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Calorie Quest: food tracking with XP, streaks and a leaderboard
//!
//! This crate provides the backend API for the mini-app: wallet sign-in,
//! proof-of-personhood checks, user sync, leaderboard reads and payments.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{PaymentService, SiweVerifier, WorldIdService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub siwe_verifier: SiweVerifier,
    pub world_id: WorldIdService,
    pub payments: PaymentService,
}

impl AppState {
    /// Build state whose outbound clients follow `config`.
    pub fn new(config: Config, db: FirestoreDb) -> Self {
        Self {
            siwe_verifier: SiweVerifier::new(config.rpc_url.clone()),
            world_id: WorldIdService::new(config.developer_api_url.clone()),
            payments: PaymentService::new(config.developer_api_url.clone()),
            config,
            db,
        }
    }
}
