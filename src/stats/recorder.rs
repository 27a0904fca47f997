//! Stats recorder - writes garden records and award commits to the database

use chrono::Utc;
use rusqlite::TransactionBehavior;
use tracing::debug;

use super::achievements::BadgeId;
use super::db::StatsDb;
use super::models::{ProgressLogRecord, TaskRecord, TaskStatus, UserId};
use super::store::{AwardCommit, StoreError};

/// Records users, tasks and progress logs, and applies award commits
#[derive(Clone)]
pub struct StatsRecorder {
    db: StatsDb,
}

impl StatsRecorder {
    pub fn new(db: StatsDb) -> Self {
        Self { db }
    }

    /// Register a user. Re-adding an existing id only updates the display name.
    pub fn add_user(&self, user: &UserId, display_name: Option<&str>) -> Result<(), StoreError> {
        let now = Utc::now().timestamp_millis();
        let conn = self.db.conn()?;
        conn.execute(
            r#"INSERT INTO users (id, display_name, created_at) VALUES (?1, ?2, ?3)
               ON CONFLICT(id) DO UPDATE SET display_name = COALESCE(?2, display_name)"#,
            rusqlite::params![user.as_str(), display_name, now],
        )?;
        Ok(())
    }

    /// Delete a user together with their tasks, logs, stats and badges
    pub fn remove_user(&self, user: &UserId) -> Result<bool, StoreError> {
        let conn = self.db.conn()?;
        let removed = conn.execute("DELETE FROM users WHERE id = ?1", [user.as_str()])?;
        Ok(removed > 0)
    }

    /// Record a new pending task
    pub fn record_task(&self, user: &UserId, title: &str) -> Result<TaskRecord, StoreError> {
        let record = TaskRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.clone(),
            title: title.to_string(),
            status: TaskStatus::Pending,
            created_at: Utc::now().timestamp_millis(),
        };
        let conn = self.db.conn()?;
        conn.execute(
            "INSERT INTO tasks (id, user_id, title, status, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                record.id, record.user_id.as_str(), record.title, record.status.as_str(),
                record.created_at,
            ],
        )?;
        Ok(record)
    }

    /// Mark a task completed. Returns false if no such task exists.
    pub fn complete_task(&self, task_id: &str) -> Result<bool, StoreError> {
        let conn = self.db.conn()?;
        let updated = conn.execute(
            "UPDATE tasks SET status = ?2 WHERE id = ?1",
            rusqlite::params![task_id, TaskStatus::Completed.as_str()],
        )?;
        Ok(updated > 0)
    }

    /// Record a crop progress log entry
    pub fn record_progress_log(
        &self,
        user: &UserId,
        crop: Option<&str>,
        note: &str,
    ) -> Result<ProgressLogRecord, StoreError> {
        let record = ProgressLogRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.clone(),
            crop: crop.map(str::to_string),
            note: note.to_string(),
            created_at: Utc::now().timestamp_millis(),
        };
        let conn = self.db.conn()?;
        conn.execute(
            "INSERT INTO progress_logs (id, user_id, crop, note, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                record.id, record.user_id.as_str(), record.crop, record.note, record.created_at,
            ],
        )?;
        Ok(record)
    }

    /// Apply an award in one immediate transaction.
    ///
    /// Returns the badges actually inserted. Dropping the transaction on any
    /// error path rolls back the stats update and every badge insert.
    pub fn commit_award(&self, commit: &AwardCommit) -> Result<Vec<BadgeId>, StoreError> {
        let now = Utc::now().timestamp_millis();
        let unlocked_at = commit.unlocked_at.timestamp_millis();
        let user = commit.user_id.as_str();

        let mut conn = self.db.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let stats_written = if commit.expected_version == 0 {
            tx.execute(
                r#"INSERT INTO user_stats (user_id, experience, level, version, updated_at)
                   VALUES (?1, ?2, ?3, 1, ?4)
                   ON CONFLICT(user_id) DO NOTHING"#,
                rusqlite::params![user, commit.experience, commit.level, now],
            )?
        } else {
            tx.execute(
                r#"UPDATE user_stats
                   SET experience = ?2, level = ?3, version = version + 1, updated_at = ?4
                   WHERE user_id = ?1 AND version = ?5 AND experience <= ?2"#,
                rusqlite::params![user, commit.experience, commit.level, now, commit.expected_version],
            )?
        };

        if stats_written == 0 {
            return Err(StoreError::Conflict {
                user: commit.user_id.clone(),
                expected_version: commit.expected_version,
            });
        }

        let mut inserted = Vec::new();
        for badge in &commit.badges {
            let added = tx.execute(
                "INSERT OR IGNORE INTO badge_unlocks (user_id, badge_id, unlocked_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![user, badge.as_str(), unlocked_at],
            )?;
            if added == 1 {
                inserted.push(*badge);
            } else {
                debug!(user, badge = %badge, "Badge already unlocked, skipping");
            }
        }

        tx.commit()?;
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatsQuery;

    fn setup() -> (StatsRecorder, StatsQuery, UserId) {
        let db = StatsDb::open_in_memory().unwrap();
        let user = UserId::from("gardener");
        let recorder = StatsRecorder::new(db.clone());
        recorder.add_user(&user, Some("Gardener")).unwrap();
        (recorder, StatsQuery::new(db), user)
    }

    fn commit(user: &UserId, expected_version: u64, experience: u64, badges: Vec<BadgeId>) -> AwardCommit {
        AwardCommit {
            user_id: user.clone(),
            expected_version,
            experience,
            level: crate::stats::level_for_xp(experience),
            badges,
            unlocked_at: Utc::now(),
        }
    }

    #[test]
    fn test_counts_follow_records() {
        let (recorder, query, user) = setup();
        let task = recorder.record_task(&user, "Water tomatoes").unwrap();
        recorder.record_task(&user, "Weed beds").unwrap();
        recorder.record_progress_log(&user, Some("tomato"), "First flowers").unwrap();
        assert!(recorder.complete_task(&task.id).unwrap());

        assert_eq!(query.count_tasks(&user).unwrap(), 2);
        assert_eq!(query.count_progress_logs(&user).unwrap(), 1);
        let tasks = query.tasks(&user).unwrap();
        assert_eq!(tasks.iter().filter(|t| t.status == TaskStatus::Completed).count(), 1);
    }

    #[test]
    fn test_first_commit_creates_stats() {
        let (recorder, query, user) = setup();
        let inserted = recorder
            .commit_award(&commit(&user, 0, 50, vec![BadgeId::FirstTask]))
            .unwrap();
        assert_eq!(inserted, vec![BadgeId::FirstTask]);

        let stats = query.load_stats(&user).unwrap().unwrap();
        assert_eq!(stats.experience, 50);
        assert_eq!(stats.level, 1);
        assert_eq!(stats.version, 1);
    }

    #[test]
    fn test_stale_version_conflicts_and_writes_nothing() {
        let (recorder, query, user) = setup();
        recorder.commit_award(&commit(&user, 0, 50, vec![])).unwrap();

        // A second "first" commit lost the race
        let err = recorder
            .commit_award(&commit(&user, 0, 100, vec![BadgeId::Explorer]))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { expected_version: 0, .. }));

        assert_eq!(query.load_stats(&user).unwrap().unwrap().experience, 50);
        assert!(query.unlocked_badges(&user).unwrap().is_empty());
    }

    #[test]
    fn test_existing_badge_is_skipped_not_failed() {
        let (recorder, query, user) = setup();
        recorder
            .commit_award(&commit(&user, 0, 50, vec![BadgeId::FirstTask]))
            .unwrap();
        let inserted = recorder
            .commit_award(&commit(&user, 1, 100, vec![BadgeId::FirstTask, BadgeId::Explorer]))
            .unwrap();

        assert_eq!(inserted, vec![BadgeId::Explorer]);
        let badges: Vec<_> = query
            .unlocked_badges(&user)
            .unwrap()
            .into_iter()
            .map(|b| b.badge)
            .collect();
        assert_eq!(badges, vec![BadgeId::FirstTask, BadgeId::Explorer]);
    }

    #[test]
    fn test_experience_never_decreases() {
        let (recorder, query, user) = setup();
        recorder.commit_award(&commit(&user, 0, 500, vec![])).unwrap();
        let err = recorder.commit_award(&commit(&user, 1, 100, vec![])).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(query.load_stats(&user).unwrap().unwrap().experience, 500);
    }

    #[test]
    fn test_remove_user_cascades() {
        let (recorder, query, user) = setup();
        recorder.record_task(&user, "Sow beans").unwrap();
        recorder
            .commit_award(&commit(&user, 0, 50, vec![BadgeId::FirstTask]))
            .unwrap();

        assert!(recorder.remove_user(&user).unwrap());
        assert!(!query.user_exists(&user).unwrap());
        assert!(query.load_stats(&user).unwrap().is_none());
        assert!(query.unlocked_badges(&user).unwrap().is_empty());
        assert_eq!(query.count_tasks(&user).unwrap(), 0);
    }
}
