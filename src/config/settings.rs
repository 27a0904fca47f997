//! Settings configuration types

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::stats::achievements::DEFAULT_MAX_COMMIT_ATTEMPTS;

/// Database location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Defaults to ~/.verdant/garden.db when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Award engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// How many times one award is attempted when another writer commits first
    #[serde(default = "default_max_commit_attempts")]
    pub max_commit_attempts: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_commit_attempts: default_max_commit_attempts(),
        }
    }
}

/// Local notification settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Announce new levels
    #[serde(default = "default_true")]
    pub level_up: bool,

    /// Announce unlocked badges
    #[serde(default = "default_true")]
    pub badges: bool,

    /// Seconds between the award and the notification firing
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level_up: true,
            badges: true,
            delay_secs: default_delay_secs(),
        }
    }
}

/// Celebration overlay settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CelebrationSettings {
    #[serde(default = "default_display_secs")]
    pub display_secs: u64,
}

impl CelebrationSettings {
    pub fn display_for(&self) -> Duration {
        Duration::from_secs(self.display_secs)
    }
}

impl Default for CelebrationSettings {
    fn default() -> Self {
        Self {
            display_secs: default_display_secs(),
        }
    }
}

fn default_max_commit_attempts() -> u32 {
    DEFAULT_MAX_COMMIT_ATTEMPTS
}

fn default_true() -> bool {
    true
}

fn default_delay_secs() -> u64 {
    1
}

fn default_display_secs() -> u64 {
    4
}
