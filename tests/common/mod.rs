//! Shared test utilities for engine integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use verdant::events::EventBus;
use verdant::stats::{
    AchievementAction, AchievementManager, AchievementResult, StatsDb, StatsManager, UserId,
};

/// On-disk garden database in a temp dir with one registered user
pub struct Garden {
    pub dir: TempDir,
    pub stats: StatsManager,
    pub bus: Arc<EventBus>,
    pub engine: AchievementManager,
    pub user: UserId,
}

impl Garden {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let stats = StatsManager::with_path(&dir.path().join("garden.db"))
            .expect("Failed to open garden db");
        let bus = Arc::new(EventBus::default());
        let engine = stats
            .achievements(bus.clone())
            .expect("Failed to build engine");
        let user = UserId::from("ana");
        stats
            .recorder()
            .add_user(&user, Some("Ana"))
            .expect("Failed to add user");

        Self {
            dir,
            stats,
            bus,
            engine,
            user,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("garden.db")
    }

    /// Second connection to the same database file
    pub fn reopen(&self) -> StatsDb {
        StatsDb::open(&self.db_path()).expect("Failed to reopen garden db")
    }

    /// Record a task, then award `createTask` the way the app does
    pub fn create_task(&self, title: &str) -> AchievementResult {
        self.stats
            .recorder()
            .record_task(&self.user, title)
            .expect("Failed to record task");
        self.award(AchievementAction::CreateTask)
    }

    /// Record a progress log, then award `addProgressLog`
    pub fn add_progress_log(&self, note: &str) -> AchievementResult {
        self.stats
            .recorder()
            .record_progress_log(&self.user, Some("tomato"), note)
            .expect("Failed to record progress log");
        self.award(AchievementAction::AddProgressLog)
    }

    pub fn award(&self, action: AchievementAction) -> AchievementResult {
        self.engine
            .award(action, &self.user)
            .expect("Award failed")
    }

    pub fn stored_experience(&self) -> u64 {
        self.stats
            .query()
            .load_stats(&self.user)
            .expect("Failed to load stats")
            .map(|s| s.experience)
            .unwrap_or(0)
    }
}
