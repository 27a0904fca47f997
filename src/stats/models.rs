//! Data models for progression tracking
//!
//! These structures represent the rows stored in and read from the garden database.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::achievements::BadgeId;

/// Opaque user identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Experience and cached level for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: UserId,
    pub experience: u64,
    pub level: u32,
    /// Optimistic concurrency token. 0 means the row has never been written.
    pub version: u64,
}

impl UserStats {
    /// Zero-state record used before the first award
    pub fn zero(user_id: UserId) -> Self {
        Self {
            user_id,
            experience: 0,
            level: 1,
            version: 0,
        }
    }
}

/// One unlocked badge for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeUnlock {
    pub user_id: UserId,
    pub badge: BadgeId,
    pub unlocked_at: DateTime<Utc>,
}

/// Status of a garden task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

/// Record for a garden task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub user_id: UserId,
    pub title: String,
    pub status: TaskStatus,
    /// ms since epoch
    pub created_at: i64,
}

/// Record for a crop progress log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressLogRecord {
    pub id: String,
    pub user_id: UserId,
    pub crop: Option<String>,
    pub note: String,
    /// ms since epoch
    pub created_at: i64,
}

/// Per-user counters consumed by the badge rules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserCounters {
    /// Pending and completed tasks
    pub tasks: u64,
    pub progress_logs: u64,
}
