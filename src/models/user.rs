// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// XP needed to reach level 2; each later level needs quadratically more.
const XP_PER_LEVEL_UNIT: u64 = 100;

/// User profile stored in the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    /// Unique username (also the document key)
    pub username: String,
    /// Accumulated experience points
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub xp: u64,
    /// Current level, never below 1
    pub level: u32,
    /// Consecutive days with at least one food entry
    pub streak: u32,
    /// Calories logged across all entries
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_calories: u64,
    /// Number of food entries logged
    pub entries_count: u32,
    /// When the user first synced (RFC 3339)
    pub created_at: String,
    /// Last sync (RFC 3339)
    pub updated_at: String,
}

/// Counters reported by the client on sync. Absent fields leave the
/// stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncUpdate {
    pub xp: Option<u64>,
    pub level: Option<u32>,
    pub streak: Option<u32>,
    pub total_calories: Option<u64>,
    pub entries_count: Option<u32>,
}

impl User {
    /// Build a fresh user record from the first sync.
    pub fn new(username: &str, update: &SyncUpdate, now: &str) -> Self {
        let mut user = Self {
            username: username.to_string(),
            xp: 0,
            level: 1,
            streak: 0,
            total_calories: 0,
            entries_count: 0,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        };
        user.merge(update, now);
        user
    }

    /// Merge client-reported counters into this record.
    ///
    /// Every counter only moves forward, so replaying a sync (or syncing a
    /// stale client) never loses progress. The level is at least the one
    /// implied by the merged XP.
    pub fn merge(&mut self, update: &SyncUpdate, now: &str) {
        if let Some(xp) = update.xp {
            self.xp = self.xp.max(xp);
        }
        if let Some(level) = update.level {
            self.level = self.level.max(level);
        }
        if let Some(streak) = update.streak {
            self.streak = self.streak.max(streak);
        }
        if let Some(calories) = update.total_calories {
            self.total_calories = self.total_calories.max(calories);
        }
        if let Some(entries) = update.entries_count {
            self.entries_count = self.entries_count.max(entries);
        }
        self.level = self.level.max(level_for_xp(self.xp));
        self.updated_at = now.to_string();
    }
}

/// Level reached with the given XP: `floor(sqrt(xp / 100)) + 1`.
///
/// 0-99 XP is level 1, 100-399 level 2, 400-899 level 3, and so on.
pub fn level_for_xp(xp: u64) -> u32 {
    let root = (xp / XP_PER_LEVEL_UNIT).isqrt();
    // isqrt of a u64 always fits in u32
    u32::try_from(root).unwrap_or(u32::MAX - 1) + 1
}
