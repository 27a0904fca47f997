//! Local notification scheduling for achievement events

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::bus::{AchievementSubscriber, AchievementUpdated};
use crate::config::NotificationSettings;
use crate::stats::{BadgeId, BadgeRegistry, UserId};

/// What a notification announces
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NotificationKind {
    LevelUp {
        level: u32,
    },
    BadgeUnlocked {
        badge: BadgeId,
        title_key: String,
        icon: String,
        /// Other badges unlocked by the same award
        additional: usize,
    },
}

/// A notification handed to the platform scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalNotification {
    pub id: String,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub fire_at: DateTime<Utc>,
}

/// Platform notification delivery
pub trait NotificationSink: Send + Sync {
    fn schedule(&self, notification: LocalNotification) -> anyhow::Result<()>;
}

/// Sink that only logs, for the CLI and headless runs
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn schedule(&self, notification: LocalNotification) -> anyhow::Result<()> {
        match &notification.kind {
            NotificationKind::LevelUp { level } => {
                info!(user = %notification.user_id, level, "Scheduled level-up notification");
            }
            NotificationKind::BadgeUnlocked { badge, additional, .. } => {
                info!(user = %notification.user_id, %badge, additional, "Scheduled badge notification");
            }
        }
        Ok(())
    }
}

/// Turns achievement events into at most one level-up and one badge notification
pub struct NotificationScheduler {
    sink: Arc<dyn NotificationSink>,
    registry: Arc<BadgeRegistry>,
    settings: NotificationSettings,
}

impl NotificationScheduler {
    pub fn new(
        sink: Arc<dyn NotificationSink>,
        registry: Arc<BadgeRegistry>,
        settings: NotificationSettings,
    ) -> Self {
        Self {
            sink,
            registry,
            settings,
        }
    }

    /// Notifications for one event, without scheduling them
    pub fn notifications_for(&self, event: &AchievementUpdated) -> Vec<LocalNotification> {
        let mut out = Vec::new();
        if !self.settings.enabled {
            return out;
        }

        let fire_at = Utc::now()
            + chrono::Duration::from_std(Duration::from_secs(self.settings.delay_secs))
                .unwrap_or_else(|_| chrono::Duration::zero());

        if event.leveled_up && self.settings.level_up {
            out.push(LocalNotification {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: event.user_id.clone(),
                kind: NotificationKind::LevelUp { level: event.level },
                fire_at,
            });
        }

        if self.settings.badges {
            if let Some(&badge) = event.new_badges.first() {
                let (title_key, icon) = match self.registry.get(badge) {
                    Some(def) => (def.title_key.clone(), def.icon.clone()),
                    None => (format!("badge.{badge}.title"), String::new()),
                };
                out.push(LocalNotification {
                    id: uuid::Uuid::new_v4().to_string(),
                    user_id: event.user_id.clone(),
                    kind: NotificationKind::BadgeUnlocked {
                        badge,
                        title_key,
                        icon,
                        additional: event.new_badges.len() - 1,
                    },
                    fire_at,
                });
            }
        }

        out
    }
}

impl AchievementSubscriber for NotificationScheduler {
    fn name(&self) -> &str {
        "notification-scheduler"
    }

    fn on_achievement(&self, event: &AchievementUpdated) -> anyhow::Result<()> {
        for notification in self.notifications_for(event) {
            let id = notification.id.clone();
            self.sink
                .schedule(notification)
                .with_context(|| format!("Failed to schedule notification {id}"))?;
        }
        Ok(())
    }
}
