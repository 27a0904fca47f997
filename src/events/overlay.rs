//! Celebration overlay state (confetti / level-up banner)
//!
//! The overlay only remembers when it was triggered. Visibility is decided on
//! read, so it dismisses itself without any timer.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::bus::{AchievementSubscriber, AchievementUpdated};
use crate::stats::{BadgeId, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Celebration {
    pub user_id: UserId,
    pub level: u32,
    pub leveled_up: bool,
    pub badges: Vec<BadgeId>,
    pub shown_at: Instant,
}

pub struct CelebrationOverlay {
    current: Mutex<Option<Celebration>>,
    display_for: Duration,
}

impl CelebrationOverlay {
    pub fn new(display_for: Duration) -> Self {
        Self {
            current: Mutex::new(None),
            display_for,
        }
    }

    /// Celebration to show right now, if any
    pub fn visible(&self) -> Option<Celebration> {
        self.visible_at(Instant::now())
    }

    /// Celebration visible at `now`. Expired celebrations are cleared.
    pub fn visible_at(&self, now: Instant) -> Option<Celebration> {
        let mut current = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let expired = current
            .as_ref()
            .is_some_and(|c| now.saturating_duration_since(c.shown_at) >= self.display_for);
        if expired {
            *current = None;
        }
        current.clone()
    }

    pub fn dismiss(&self) {
        match self.current.lock() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }
}

impl AchievementSubscriber for CelebrationOverlay {
    fn name(&self) -> &str {
        "celebration-overlay"
    }

    fn on_achievement(&self, event: &AchievementUpdated) -> anyhow::Result<()> {
        if !event.is_celebration() {
            return Ok(());
        }
        let celebration = Celebration {
            user_id: event.user_id.clone(),
            level: event.level,
            leveled_up: event.leveled_up,
            badges: event.new_badges.clone(),
            shown_at: Instant::now(),
        };
        match self.current.lock() {
            Ok(mut guard) => *guard = Some(celebration),
            Err(poisoned) => *poisoned.into_inner() = Some(celebration),
        }
        Ok(())
    }
}
