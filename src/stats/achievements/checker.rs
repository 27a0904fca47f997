//! Badge unlock rules
//!
//! A fixed, ordered rule list evaluated once per award. Rules only decide which
//! badges qualify; whether a badge is actually new is settled by the store.

use std::collections::HashSet;
use std::sync::Arc;

use super::actions::AchievementAction;
use super::definitions::{BadgeId, BadgeRegistry};
use crate::stats::models::UserCounters;

/// Condition under which a badge unlocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockCondition {
    /// This award raised the level, and the new level is a multiple of `every`
    LevelMilestone { every: u32 },
    /// At least this many tasks (pending or completed)
    TaskCount(u64),
    /// At least this many progress logs
    ProgressLogCount(u64),
    /// The triggering action is this one
    Action(AchievementAction),
}

impl UnlockCondition {
    fn holds(&self, ctx: &RuleContext) -> bool {
        match *self {
            Self::LevelMilestone { every } => {
                ctx.leveled_up && every > 0 && ctx.new_level % every == 0
            }
            Self::TaskCount(threshold) => ctx.counters.tasks >= threshold,
            Self::ProgressLogCount(threshold) => ctx.counters.progress_logs >= threshold,
            Self::Action(action) => ctx.action == action,
        }
    }
}

/// One badge and what unlocks it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeRule {
    pub badge: BadgeId,
    pub condition: UnlockCondition,
}

/// Inputs for one evaluation
#[derive(Debug, Clone, Copy)]
pub struct RuleContext {
    pub action: AchievementAction,
    pub new_level: u32,
    pub leveled_up: bool,
    pub counters: UserCounters,
}

#[derive(Debug, thiserror::Error)]
pub enum RuleSetError {
    #[error("Rule references badge '{0}' which is not in the registry")]
    UnknownBadge(BadgeId),

    #[error("Badge '{0}' has more than one rule")]
    DuplicateRule(BadgeId),
}

/// Ordered badge rules bound to a registry
#[derive(Debug, Clone)]
pub struct BadgeRuleSet {
    registry: Arc<BadgeRegistry>,
    rules: Vec<BadgeRule>,
}

impl BadgeRuleSet {
    /// Build a rule set. Every rule must name a registered badge, at most once.
    pub fn new(registry: Arc<BadgeRegistry>, rules: Vec<BadgeRule>) -> Result<Self, RuleSetError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !registry.contains(rule.badge) {
                return Err(RuleSetError::UnknownBadge(rule.badge));
            }
            if !seen.insert(rule.badge) {
                return Err(RuleSetError::DuplicateRule(rule.badge));
            }
        }
        Ok(Self { registry, rules })
    }

    /// The garden app's rules, in evaluation order
    pub fn standard(registry: Arc<BadgeRegistry>) -> Result<Self, RuleSetError> {
        Self::new(registry, Self::standard_rules())
    }

    pub fn standard_rules() -> Vec<BadgeRule> {
        vec![
            BadgeRule {
                badge: BadgeId::LevelMilestone,
                condition: UnlockCondition::LevelMilestone { every: 3 },
            },
            BadgeRule {
                badge: BadgeId::FirstTask,
                condition: UnlockCondition::TaskCount(1),
            },
            BadgeRule {
                badge: BadgeId::TaskCollector,
                condition: UnlockCondition::TaskCount(10),
            },
            BadgeRule {
                badge: BadgeId::LoggerNovice,
                condition: UnlockCondition::ProgressLogCount(5),
            },
            BadgeRule {
                badge: BadgeId::LoggerMaster,
                condition: UnlockCondition::ProgressLogCount(50),
            },
            BadgeRule {
                badge: BadgeId::Explorer,
                condition: UnlockCondition::Action(AchievementAction::AcceptRecommendation),
            },
        ]
    }

    /// Badges whose condition holds and that are not in `unlocked`, in rule order
    pub fn evaluate(&self, ctx: &RuleContext, unlocked: &HashSet<BadgeId>) -> Vec<BadgeId> {
        self.rules
            .iter()
            .filter(|rule| !unlocked.contains(&rule.badge) && rule.condition.holds(ctx))
            .map(|rule| rule.badge)
            .collect()
    }

    pub fn rules(&self) -> &[BadgeRule] {
        &self.rules
    }

    pub fn registry(&self) -> &Arc<BadgeRegistry> {
        &self.registry
    }
}
