//! Progression tracking for the garden app
//!
//! Stores users, tasks, progress logs, experience and badge unlocks in a
//! SQLite database (`~/.verdant/garden.db`) and runs the achievement engine
//! on top of it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐  award()  ┌─────────────────────┐  publish  ┌─────────────┐
//! │ Screens / CLI    │ ────────▶ │ AchievementManager  │ ────────▶ │  EventBus   │
//! └──────────────────┘           └──────────┬──────────┘           └──────┬──────┘
//!                                           │ UserDirectory               │
//!                                           │ CounterLookup               ▼
//!                                           │ AchievementStore     notifications,
//!                                           ▼                      overlay, banner
//!                                  ~/.verdant/garden.db
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let stats = StatsManager::new()?;
//! let user = UserId::from("ana");
//! stats.recorder().add_user(&user, Some("Ana"))?;
//! stats.recorder().record_task(&user, "Water the tomatoes")?;
//!
//! let engine = stats.achievements(Arc::new(EventBus::default()))?;
//! let result = engine.award(AchievementAction::CreateTask, &user)?;
//! ```

pub mod achievements;
mod db;
mod models;
mod queries;
mod recorder;
mod store;

pub use achievements::{
    AchievementAction, AchievementManager, AchievementResult, AwardError, BadgeDefinition,
    BadgeId, BadgeRegistry, BadgeRuleSet, UserProgress, level_for_xp, progress_to_next_level,
    xp_for_level,
};
pub use db::StatsDb;
pub use models::{
    BadgeUnlock, ProgressLogRecord, TaskRecord, TaskStatus, UserCounters, UserId, UserStats,
};
pub use queries::StatsQuery;
pub use recorder::StatsRecorder;
pub use store::{AchievementStore, AwardCommit, CounterLookup, StoreError, UserDirectory};

use std::sync::Arc;

use anyhow::Result;

use crate::events::EventBus;

/// Central manager for the garden database
///
/// Thread-safe through the internal mutex on the database connection.
#[derive(Clone)]
pub struct StatsManager {
    db: StatsDb,
}

impl StatsManager {
    /// Create a new StatsManager with the default database location
    pub fn new() -> Result<Self> {
        let db = StatsDb::open_default()?;
        Ok(Self { db })
    }

    /// Create a StatsManager with a custom database path
    pub fn with_path(path: &std::path::Path) -> Result<Self> {
        let db = StatsDb::open(path)?;
        Ok(Self { db })
    }

    pub fn db(&self) -> &StatsDb {
        &self.db
    }

    /// Get a recorder for writing garden records
    pub fn recorder(&self) -> StatsRecorder {
        StatsRecorder::new(self.db.clone())
    }

    /// Get a query interface for reading progression data
    pub fn query(&self) -> StatsQuery {
        StatsQuery::new(self.db.clone())
    }

    /// Achievement engine with the builtin badges and rules
    pub fn achievements(&self, bus: Arc<EventBus>) -> Result<AchievementManager> {
        let registry = Arc::new(BadgeRegistry::builtin());
        let rules = BadgeRuleSet::standard(registry)?;
        Ok(AchievementManager::with_db(self.db.clone(), rules, bus))
    }
}
