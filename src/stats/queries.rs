//! Stats queries - reads progression data and counters

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};

use super::achievements::BadgeId;
use super::db::StatsDb;
use super::models::{BadgeUnlock, TaskRecord, TaskStatus, UserId, UserStats};
use super::store::{CounterLookup, StoreError, UserDirectory};

/// Query interface for reading progression data
#[derive(Clone)]
pub struct StatsQuery {
    db: StatsDb,
}

impl StatsQuery {
    pub fn new(db: StatsDb) -> Self {
        Self { db }
    }

    pub fn user_exists(&self, user: &UserId) -> Result<bool, StoreError> {
        let conn = self.db.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE id = ?1",
            [user.as_str()],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    /// Pending and completed tasks
    pub fn count_tasks(&self, user: &UserId) -> Result<u64, StoreError> {
        let conn = self.db.conn()?;
        count_rows(&conn, "SELECT COUNT(*) FROM tasks WHERE user_id = ?1", user)
    }

    pub fn count_progress_logs(&self, user: &UserId) -> Result<u64, StoreError> {
        let conn = self.db.conn()?;
        count_rows(&conn, "SELECT COUNT(*) FROM progress_logs WHERE user_id = ?1", user)
    }

    /// Stats row for a user, `None` before the first award
    pub fn load_stats(&self, user: &UserId) -> Result<Option<UserStats>, StoreError> {
        let conn = self.db.conn()?;
        let row = conn
            .query_row(
                "SELECT experience, level, version FROM user_stats WHERE user_id = ?1",
                [user.as_str()],
                |r| Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?, r.get::<_, i64>(2)?)),
            )
            .optional()?;

        let Some((experience, level, version)) = row else {
            return Ok(None);
        };

        let corrupt = |field: &str| StoreError::Corrupt(format!("user_stats.{field} for {user}"));
        Ok(Some(UserStats {
            user_id: user.clone(),
            experience: u64::try_from(experience).map_err(|_| corrupt("experience"))?,
            level: u32::try_from(level)
                .ok()
                .filter(|l| *l >= 1)
                .ok_or_else(|| corrupt("level"))?,
            version: u64::try_from(version).map_err(|_| corrupt("version"))?,
        }))
    }

    /// Unlocked badges, oldest first
    pub fn unlocked_badges(&self, user: &UserId) -> Result<Vec<BadgeUnlock>, StoreError> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(
            "SELECT badge_id, unlocked_at FROM badge_unlocks WHERE user_id = ?1 ORDER BY unlocked_at, rowid",
        )?;
        let rows = stmt
            .query_map([user.as_str()], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(badge_id, unlocked_ms)| {
                let badge = BadgeId::from_str(&badge_id)
                    .ok_or_else(|| StoreError::Corrupt(format!("unknown badge id '{badge_id}'")))?;
                Ok(BadgeUnlock {
                    user_id: user.clone(),
                    badge,
                    unlocked_at: DateTime::<Utc>::from_timestamp_millis(unlocked_ms)
                        .unwrap_or_default(),
                })
            })
            .collect()
    }

    /// Tasks for a user, newest first
    pub fn tasks(&self, user: &UserId) -> Result<Vec<TaskRecord>, StoreError> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, status, created_at FROM tasks WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
            .query_map([user.as_str()], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, i64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .map(|(id, title, status, created_at)| TaskRecord {
                id,
                user_id: user.clone(),
                title,
                status: if status == TaskStatus::Completed.as_str() {
                    TaskStatus::Completed
                } else {
                    TaskStatus::Pending
                },
                created_at,
            })
            .collect())
    }
}

fn count_rows(conn: &Connection, sql: &str, user: &UserId) -> Result<u64, StoreError> {
    let count: i64 = conn.query_row(sql, [user.as_str()], |r| r.get(0))?;
    Ok(u64::try_from(count).unwrap_or(0))
}

impl UserDirectory for StatsDb {
    fn user_exists(&self, user: &UserId) -> Result<bool, StoreError> {
        StatsQuery::new(self.clone()).user_exists(user)
    }
}

impl CounterLookup for StatsDb {
    fn count_tasks(&self, user: &UserId) -> Result<u64, StoreError> {
        StatsQuery::new(self.clone()).count_tasks(user)
    }

    fn count_progress_logs(&self, user: &UserId) -> Result<u64, StoreError> {
        StatsQuery::new(self.clone()).count_progress_logs(user)
    }
}
