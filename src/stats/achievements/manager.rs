//! Achievement Manager - Core gamification logic
//!
//! One entry point, [`AchievementManager::award`]: apply an action's XP, derive
//! the level, evaluate badge rules, commit everything atomically and publish
//! the outcome.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::actions::AchievementAction;
use super::checker::{BadgeRuleSet, RuleContext};
use super::definitions::{BadgeId, BadgeRegistry};
use super::levels::{UserProgress, level_for_xp};
use crate::events::{AchievementUpdated, EventBus};
use crate::stats::StatsDb;
use crate::stats::models::{BadgeUnlock, UserCounters, UserId, UserStats};
use crate::stats::store::{AchievementStore, AwardCommit, CounterLookup, StoreError, UserDirectory};

/// Attempts per award when another writer keeps winning the race
pub const DEFAULT_MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Outcome of one award call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementResult {
    pub experience: u64,
    pub level: u32,
    pub leveled_up: bool,
    /// Badges unlocked by this call only, in rule order
    pub new_badges: Vec<BadgeId>,
}

impl AchievementResult {
    /// Neutral result for unknown users
    pub fn zero() -> Self {
        Self {
            experience: 0,
            level: 1,
            leveled_up: false,
            new_badges: Vec::new(),
        }
    }

    fn to_event(&self, user: &UserId) -> AchievementUpdated {
        AchievementUpdated {
            user_id: user.clone(),
            experience: self.experience,
            level: self.level,
            leveled_up: self.leveled_up,
            new_badges: self.new_badges.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AwardError {
    /// Nothing from this award was stored and no event was published
    #[error("Failed to persist award for user {user} after {attempts} attempt(s): {source}")]
    Persistence {
        user: UserId,
        attempts: u32,
        #[source]
        source: StoreError,
    },
}

/// Per-user mutexes. The table lock is held only to fetch a user's entry.
#[derive(Default)]
struct UserLocks {
    table: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    fn lock_for(&self, user: &UserId) -> Arc<Mutex<()>> {
        let mut table = match self.table.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        table.entry(user.clone()).or_default().clone()
    }
}

/// Main manager for experience, levels and badges
pub struct AchievementManager {
    users: Arc<dyn UserDirectory>,
    counters: Arc<dyn CounterLookup>,
    store: Arc<dyn AchievementStore>,
    rules: BadgeRuleSet,
    bus: Arc<EventBus>,
    locks: UserLocks,
    max_commit_attempts: u32,
}

impl AchievementManager {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        counters: Arc<dyn CounterLookup>,
        store: Arc<dyn AchievementStore>,
        rules: BadgeRuleSet,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            users,
            counters,
            store,
            rules,
            bus,
            locks: UserLocks::default(),
            max_commit_attempts: DEFAULT_MAX_COMMIT_ATTEMPTS,
        }
    }

    /// Manager backed entirely by one database
    pub fn with_db(db: StatsDb, rules: BadgeRuleSet, bus: Arc<EventBus>) -> Self {
        let db = Arc::new(db);
        Self::new(db.clone(), db.clone(), db, rules, bus)
    }

    pub fn with_max_commit_attempts(mut self, attempts: u32) -> Self {
        self.max_commit_attempts = attempts.max(1);
        self
    }

    pub fn registry(&self) -> &Arc<BadgeRegistry> {
        self.rules.registry()
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Award the XP for `action` to `user`.
    ///
    /// Unknown users get [`AchievementResult::zero`] with no side effects. On
    /// success the same data is published as an [`AchievementUpdated`].
    pub fn award(
        &self,
        action: AchievementAction,
        user: &UserId,
    ) -> Result<AchievementResult, AwardError> {
        let lock = self.locks.lock_for(user);
        let _guard = match lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let exists = self
            .users
            .user_exists(user)
            .map_err(|source| AwardError::Persistence {
                user: user.clone(),
                attempts: 1,
                source,
            })?;
        if !exists {
            debug!(%user, %action, "Award for unknown user ignored");
            return Ok(AchievementResult::zero());
        }

        let mut attempt = 0;
        let result = loop {
            attempt += 1;
            match self.try_award(action, user) {
                Ok(result) => break result,
                Err(StoreError::Conflict { expected_version, .. })
                    if attempt < self.max_commit_attempts =>
                {
                    warn!(%user, %action, attempt, expected_version, "Award conflicted with another writer, retrying");
                }
                Err(source) => {
                    return Err(AwardError::Persistence {
                        user: user.clone(),
                        attempts: attempt,
                        source,
                    });
                }
            }
        };

        if result.leveled_up {
            info!(%user, level = result.level, experience = result.experience, "Level up");
        }
        for badge in &result.new_badges {
            info!(%user, %badge, "Badge unlocked");
        }

        // Still under the user's lock, so events for one user leave in commit order
        self.bus.publish(result.to_event(user));
        Ok(result)
    }

    /// One read-evaluate-commit pass
    fn try_award(
        &self,
        action: AchievementAction,
        user: &UserId,
    ) -> Result<AchievementResult, StoreError> {
        let stats = self
            .store
            .load_stats(user)?
            .unwrap_or_else(|| UserStats::zero(user.clone()));
        let unlocked: HashSet<BadgeId> = self
            .store
            .unlocked_badges(user)?
            .into_iter()
            .map(|u| u.badge)
            .collect();
        let counters = UserCounters {
            tasks: self.counters.count_tasks(user)?,
            progress_logs: self.counters.count_progress_logs(user)?,
        };

        let experience = stats.experience.saturating_add(action.experience_value());
        let level = level_for_xp(experience);
        let leveled_up = level > stats.level;

        let candidates = self.rules.evaluate(
            &RuleContext {
                action,
                new_level: level,
                leveled_up,
                counters,
            },
            &unlocked,
        );
        debug!(
            %user, %action, old_xp = stats.experience, experience, level,
            tasks = counters.tasks, logs = counters.progress_logs,
            candidates = candidates.len(),
            "Evaluated award"
        );

        let new_badges = self.store.commit(&AwardCommit {
            user_id: user.clone(),
            expected_version: stats.version,
            experience,
            level,
            badges: candidates,
            unlocked_at: Utc::now(),
        })?;

        Ok(AchievementResult {
            experience,
            level,
            leveled_up,
            new_badges,
        })
    }

    /// Current progression, `None` if the user does not exist
    pub fn progress(&self, user: &UserId) -> Result<Option<UserProgress>, StoreError> {
        if !self.users.user_exists(user)? {
            return Ok(None);
        }
        let experience = self
            .store
            .load_stats(user)?
            .map(|s| s.experience)
            .unwrap_or(0);
        Ok(Some(UserProgress::new(experience)))
    }

    /// Unlocked badges, oldest first
    pub fn unlocked_badges(&self, user: &UserId) -> Result<Vec<BadgeUnlock>, StoreError> {
        self.store.unlocked_badges(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    /// In-memory collaborator with failure injection
    #[derive(Default)]
    struct MemoryStore {
        users: Mutex<HashSet<UserId>>,
        stats: Mutex<HashMap<UserId, UserStats>>,
        badges: Mutex<Vec<BadgeUnlock>>,
        tasks: AtomicU32,
        logs: AtomicU32,
        fail_commit: AtomicBool,
        fail_counters: AtomicBool,
        /// Commits that will report a conflict before one succeeds
        conflicts: AtomicU32,
        commits: AtomicU32,
    }

    fn injected() -> StoreError {
        StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
    }

    impl UserDirectory for MemoryStore {
        fn user_exists(&self, user: &UserId) -> Result<bool, StoreError> {
            Ok(self.users.lock().unwrap().contains(user))
        }
    }

    impl CounterLookup for MemoryStore {
        fn count_tasks(&self, _user: &UserId) -> Result<u64, StoreError> {
            if self.fail_counters.load(Ordering::SeqCst) {
                return Err(injected());
            }
            Ok(u64::from(self.tasks.load(Ordering::SeqCst)))
        }

        fn count_progress_logs(&self, _user: &UserId) -> Result<u64, StoreError> {
            Ok(u64::from(self.logs.load(Ordering::SeqCst)))
        }
    }

    impl AchievementStore for MemoryStore {
        fn load_stats(&self, user: &UserId) -> Result<Option<UserStats>, StoreError> {
            Ok(self.stats.lock().unwrap().get(user).cloned())
        }

        fn unlocked_badges(&self, user: &UserId) -> Result<Vec<BadgeUnlock>, StoreError> {
            Ok(self
                .badges
                .lock()
                .unwrap()
                .iter()
                .filter(|b| &b.user_id == user)
                .cloned()
                .collect())
        }

        fn commit(&self, commit: &AwardCommit) -> Result<Vec<BadgeId>, StoreError> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            if self.fail_commit.load(Ordering::SeqCst) {
                return Err(injected());
            }
            if self
                .conflicts
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StoreError::Conflict {
                    user: commit.user_id.clone(),
                    expected_version: commit.expected_version,
                });
            }

            let mut stats = self.stats.lock().unwrap();
            let current = stats.get(&commit.user_id).map(|s| s.version).unwrap_or(0);
            if current != commit.expected_version {
                return Err(StoreError::Conflict {
                    user: commit.user_id.clone(),
                    expected_version: commit.expected_version,
                });
            }
            stats.insert(
                commit.user_id.clone(),
                UserStats {
                    user_id: commit.user_id.clone(),
                    experience: commit.experience,
                    level: commit.level,
                    version: current + 1,
                },
            );

            let mut badges = self.badges.lock().unwrap();
            let mut inserted = Vec::new();
            for badge in &commit.badges {
                if !badges.iter().any(|b| b.user_id == commit.user_id && b.badge == *badge) {
                    badges.push(BadgeUnlock {
                        user_id: commit.user_id.clone(),
                        badge: *badge,
                        unlocked_at: commit.unlocked_at,
                    });
                    inserted.push(*badge);
                }
            }
            Ok(inserted)
        }
    }

    fn setup() -> (AchievementManager, Arc<MemoryStore>, Arc<EventBus>, UserId) {
        let store = Arc::new(MemoryStore::default());
        let user = UserId::from("gardener");
        store.users.lock().unwrap().insert(user.clone());
        let bus = Arc::new(EventBus::default());
        let rules = BadgeRuleSet::standard(Arc::new(BadgeRegistry::builtin())).unwrap();
        let manager =
            AchievementManager::new(store.clone(), store.clone(), store.clone(), rules, bus.clone());
        (manager, store, bus, user)
    }

    #[test]
    fn test_unknown_user_gets_zero_result_and_no_event() {
        let (manager, store, bus, _) = setup();
        let mut rx = bus.receiver().unwrap();

        let result = manager
            .award(AchievementAction::CreateTask, &UserId::from("nobody"))
            .unwrap();

        assert_eq!(result, AchievementResult::zero());
        assert_eq!(store.commits.load(Ordering::SeqCst), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_award_publishes_matching_event() {
        let (manager, store, bus, user) = setup();
        let mut rx = bus.receiver().unwrap();
        store.tasks.store(1, Ordering::SeqCst);

        let result = manager.award(AchievementAction::CreateTask, &user).unwrap();
        assert_eq!(result.experience, 50);
        assert_eq!(result.level, 1);
        assert!(!result.leveled_up);
        assert_eq!(result.new_badges, vec![BadgeId::FirstTask]);

        let event = rx.try_recv().unwrap();
        assert_eq!(event, result.to_event(&user));
    }

    #[test]
    fn test_failed_commit_reports_error_and_publishes_nothing() {
        let (manager, store, bus, user) = setup();
        let mut rx = bus.receiver().unwrap();
        store.fail_commit.store(true, Ordering::SeqCst);

        let err = manager
            .award(AchievementAction::AcceptRecommendation, &user)
            .unwrap_err();

        assert!(matches!(err, AwardError::Persistence { attempts: 1, .. }));
        assert!(rx.try_recv().is_err());
        assert!(store.load_stats(&user).unwrap().is_none());
        assert!(store.unlocked_badges(&user).unwrap().is_empty());
    }

    #[test]
    fn test_counter_failure_is_a_persistence_failure() {
        let (manager, store, bus, user) = setup();
        let mut rx = bus.receiver().unwrap();
        store.fail_counters.store(true, Ordering::SeqCst);

        let err = manager.award(AchievementAction::CreateTask, &user).unwrap_err();

        assert!(matches!(err, AwardError::Persistence { .. }));
        assert_eq!(store.commits.load(Ordering::SeqCst), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_conflicts_are_retried() {
        let (manager, store, _bus, user) = setup();
        store.conflicts.store(2, Ordering::SeqCst);

        let result = manager.award(AchievementAction::CreateTask, &user).unwrap();

        assert_eq!(result.experience, 50);
        assert_eq!(store.commits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_conflicts_exhaust_attempts() {
        let (manager, store, bus, user) = setup();
        let manager = manager.with_max_commit_attempts(2);
        let mut rx = bus.receiver().unwrap();
        store.conflicts.store(5, Ordering::SeqCst);

        let err = manager.award(AchievementAction::CreateTask, &user).unwrap_err();

        match err {
            AwardError::Persistence { attempts, source, .. } => {
                assert_eq!(attempts, 2);
                assert!(matches!(source, StoreError::Conflict { .. }));
            }
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_level_up_detected_from_cached_level() {
        let (manager, store, _bus, user) = setup();
        store.stats.lock().unwrap().insert(
            user.clone(),
            UserStats {
                user_id: user.clone(),
                experience: 380,
                level: 2,
                version: 4,
            },
        );

        let result = manager.award(AchievementAction::AcceptRecommendation, &user).unwrap();

        assert_eq!(result.experience, 410);
        assert_eq!(result.level, 3);
        assert!(result.leveled_up);
        assert_eq!(result.new_badges, vec![BadgeId::LevelMilestone, BadgeId::Explorer]);
    }

    #[test]
    fn test_progress_for_known_and_unknown_users() {
        let (manager, _store, _bus, user) = setup();
        assert_eq!(manager.progress(&UserId::from("nobody")).unwrap(), None);
        assert_eq!(manager.progress(&user).unwrap(), Some(UserProgress::new(0)));

        manager.award(AchievementAction::AddProgressLog, &user).unwrap();
        assert_eq!(manager.progress(&user).unwrap().unwrap().experience, 20);
    }
}
