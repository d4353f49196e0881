// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Leaderboard projection over stored users.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::User;

/// One ranked row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: u32,
    pub username: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub xp: u64,
    pub level: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_calories: u64,
    pub streak: u32,
    /// When the user joined (RFC 3339)
    pub joined_at: String,
    pub entries_count: u32,
}

/// Leaderboard ordering: XP desc, level desc, earliest join, username.
pub fn compare_for_ranking(a: &User, b: &User) -> Ordering {
    b.xp.cmp(&a.xp)
        .then_with(|| b.level.cmp(&a.level))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.username.cmp(&b.username))
}

/// Sort users into ranking order, keep the top `limit`, and number them.
pub fn rank_users(mut users: Vec<User>, limit: usize) -> Vec<LeaderboardEntry> {
    users.sort_by(compare_for_ranking);
    users
        .into_iter()
        .take(limit)
        .zip(1u32..)
        .map(|(user, rank)| LeaderboardEntry {
            rank,
            username: user.username,
            xp: user.xp,
            level: user.level,
            total_calories: user.total_calories,
            streak: user.streak,
            joined_at: user.created_at,
            entries_count: user.entries_count,
        })
        .collect()
}
