//! Verdant - garden progression engine
//!
//! Verdant turns garden actions (creating a task, logging crop progress,
//! accepting a recommendation) into experience points, levels and one-time
//! badges, and tells the rest of the app about it.
//!
//! ## Pieces
//!
//! 1. **Stats** ([`stats`]): SQLite-backed users, tasks and progress logs,
//!    plus the achievement engine that awards XP and unlocks badges.
//!
//! 2. **Events** ([`events`]): an in-process fan-out bus carrying one
//!    [`events::AchievementUpdated`] per committed award, and the subscribers
//!    that turn it into notifications, celebrations and the summary banner.
//!
//! 3. **Config** ([`config`]): `~/.verdant/config.toml`.

pub mod config;
pub mod events;
pub mod stats;

pub use config::Config;
pub use events::{AchievementUpdated, EventBus};
pub use stats::{AchievementAction, AchievementManager, AchievementResult, BadgeId, UserId};
