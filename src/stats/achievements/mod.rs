//! Gamification system: XP, Levels and Badges
//!
//! This module turns garden actions into experience, levels and one-time badges.

mod actions;
mod checker;
mod definitions;
mod levels;
mod manager;

pub use actions::{AchievementAction, XpRewards};
pub use checker::{BadgeRule, BadgeRuleSet, RuleContext, RuleSetError, UnlockCondition};
pub use definitions::{BadgeDefinition, BadgeId, BadgeRegistry};
pub use levels::{UserProgress, level_for_xp, progress_to_next_level, xp_for_level};
pub use manager::{AchievementManager, AchievementResult, AwardError, DEFAULT_MAX_COMMIT_ATTEMPTS};
