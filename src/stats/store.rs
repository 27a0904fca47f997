//! Collaborator interfaces consumed by the achievement engine
//!
//! The engine never talks to SQLite directly. It sees three narrow capabilities:
//! user lookup, per-user counters, and an atomic award commit. [`StatsDb`]
//! implements all three; tests substitute their own.
//!
//! [`StatsDb`]: super::StatsDb

use chrono::{DateTime, Utc};

use super::achievements::BadgeId;
use super::models::{BadgeUnlock, UserId, UserStats};

/// Errors raised by a store implementation
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Another writer committed first. `expected_version` is what this writer read.
    #[error("Concurrent update for user {user} (expected version {expected_version})")]
    Conflict { user: UserId, expected_version: u64 },

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Resolves a user identifier, or signals absence
pub trait UserDirectory: Send + Sync {
    fn user_exists(&self, user: &UserId) -> Result<bool, StoreError>;
}

/// Counts the records the badge rules are evaluated against
pub trait CounterLookup: Send + Sync {
    fn count_tasks(&self, user: &UserId) -> Result<u64, StoreError>;
    fn count_progress_logs(&self, user: &UserId) -> Result<u64, StoreError>;
}

/// Everything one award wants to persist, applied all-or-nothing
#[derive(Debug, Clone)]
pub struct AwardCommit {
    pub user_id: UserId,
    /// Version read before the award. 0 means "no stats row may exist yet".
    pub expected_version: u64,
    pub experience: u64,
    pub level: u32,
    /// Candidate badges in rule order
    pub badges: Vec<BadgeId>,
    pub unlocked_at: DateTime<Utc>,
}

/// Persistence of stats and badge unlocks
pub trait AchievementStore: Send + Sync {
    fn load_stats(&self, user: &UserId) -> Result<Option<UserStats>, StoreError>;

    fn unlocked_badges(&self, user: &UserId) -> Result<Vec<BadgeUnlock>, StoreError>;

    /// Apply the commit atomically.
    ///
    /// Returns the badges that were actually inserted, in proposal order. A
    /// badge already present for the user is skipped, not an error. A version
    /// mismatch fails with [`StoreError::Conflict`] and nothing is written.
    fn commit(&self, commit: &AwardCommit) -> Result<Vec<BadgeId>, StoreError>;
}

impl AchievementStore for super::StatsDb {
    fn load_stats(&self, user: &UserId) -> Result<Option<UserStats>, StoreError> {
        super::StatsQuery::new(self.clone()).load_stats(user)
    }

    fn unlocked_badges(&self, user: &UserId) -> Result<Vec<BadgeUnlock>, StoreError> {
        super::StatsQuery::new(self.clone()).unlocked_badges(user)
    }

    fn commit(&self, commit: &AwardCommit) -> Result<Vec<BadgeId>, StoreError> {
        super::StatsRecorder::new(self.clone()).commit_award(commit)
    }
}
