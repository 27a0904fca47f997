//! Actions that award experience

use serde::{Deserialize, Serialize};

/// XP rewards for each action
pub struct XpRewards;

impl XpRewards {
    pub const CREATE_TASK: u64 = 50;
    pub const ADD_PROGRESS_LOG: u64 = 20;
    pub const ACCEPT_RECOMMENDATION: u64 = 30;
}

/// User action that triggers an award
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AchievementAction {
    CreateTask,
    AddProgressLog,
    AcceptRecommendation,
}

impl AchievementAction {
    /// Fixed XP granted for this action
    pub fn experience_value(&self) -> u64 {
        match self {
            Self::CreateTask => XpRewards::CREATE_TASK,
            Self::AddProgressLog => XpRewards::ADD_PROGRESS_LOG,
            Self::AcceptRecommendation => XpRewards::ACCEPT_RECOMMENDATION,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateTask => "createTask",
            Self::AddProgressLog => "addProgressLog",
            Self::AcceptRecommendation => "acceptRecommendation",
        }
    }

    pub fn all() -> &'static [AchievementAction] {
        &[
            Self::CreateTask,
            Self::AddProgressLog,
            Self::AcceptRecommendation,
        ]
    }
}

impl std::fmt::Display for AchievementAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
