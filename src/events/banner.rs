//! Per-user progress summary for the home screen banner

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;

use super::bus::{AchievementSubscriber, AchievementUpdated};
use crate::stats::{BadgeId, UserId, UserProgress};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BannerSummary {
    pub progress: UserProgress,
    /// Badges unlocked by the most recent award that unlocked any
    pub recent_badges: Vec<BadgeId>,
}

#[derive(Default)]
pub struct SummaryBanner {
    latest: Mutex<HashMap<UserId, BannerSummary>>,
}

impl SummaryBanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary_for(&self, user: &UserId) -> Option<BannerSummary> {
        let latest = match self.latest.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        latest.get(user).cloned()
    }
}

impl AchievementSubscriber for SummaryBanner {
    fn name(&self) -> &str {
        "summary-banner"
    }

    fn on_achievement(&self, event: &AchievementUpdated) -> anyhow::Result<()> {
        let mut latest = match self.latest.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let recent_badges = if event.new_badges.is_empty() {
            latest
                .get(&event.user_id)
                .map(|s| s.recent_badges.clone())
                .unwrap_or_default()
        } else {
            event.new_badges.clone()
        };
        latest.insert(
            event.user_id.clone(),
            BannerSummary {
                progress: UserProgress::new(event.experience),
                recent_badges,
            },
        );
        Ok(())
    }
}
