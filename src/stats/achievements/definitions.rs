//! Badge definitions and metadata
//!
//! The registry is an ordinary value built at startup and handed to whoever
//! needs it (rule set, notification scheduler, screens). Nothing here is global.

use serde::{Deserialize, Serialize};

/// Unique identifier for each badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeId {
    LevelMilestone,
    FirstTask,
    TaskCollector,
    LoggerNovice,
    LoggerMaster,
    Explorer,
}

impl BadgeId {
    /// Get the string ID for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LevelMilestone => "level_milestone",
            Self::FirstTask => "first_task",
            Self::TaskCollector => "task_collector",
            Self::LoggerNovice => "logger_novice",
            Self::LoggerMaster => "logger_master",
            Self::Explorer => "explorer",
        }
    }

    /// Parse from database string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "level_milestone" => Some(Self::LevelMilestone),
            "first_task" => Some(Self::FirstTask),
            "task_collector" => Some(Self::TaskCollector),
            "logger_novice" => Some(Self::LoggerNovice),
            "logger_master" => Some(Self::LoggerMaster),
            "explorer" => Some(Self::Explorer),
            _ => None,
        }
    }

    /// Get all badge IDs
    pub fn all() -> &'static [BadgeId] {
        &[
            Self::LevelMilestone,
            Self::FirstTask,
            Self::TaskCollector,
            Self::LoggerNovice,
            Self::LoggerMaster,
            Self::Explorer,
        ]
    }
}

impl std::fmt::Display for BadgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display metadata for one badge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeDefinition {
    pub id: BadgeId,
    /// Localization key for the title
    pub title_key: String,
    /// Localization key for the description
    pub description_key: String,
    /// Icon asset identifier
    pub icon: String,
}

impl BadgeDefinition {
    /// Definition with keys derived from the badge id (`badge.<id>.title`)
    pub fn keyed(id: BadgeId, icon: &str) -> Self {
        Self {
            id,
            title_key: format!("badge.{}.title", id.as_str()),
            description_key: format!("badge.{}.description", id.as_str()),
            icon: icon.to_string(),
        }
    }
}

/// Read-only lookup from badge id to display metadata
#[derive(Debug, Clone, Default)]
pub struct BadgeRegistry {
    definitions: Vec<BadgeDefinition>,
}

impl BadgeRegistry {
    /// Build a registry. Later duplicates of an id are ignored.
    pub fn new(definitions: impl IntoIterator<Item = BadgeDefinition>) -> Self {
        let mut registry = Self::default();
        for def in definitions {
            if !registry.contains(def.id) {
                registry.definitions.push(def);
            }
        }
        registry
    }

    /// The badges shipped with the app
    pub fn builtin() -> Self {
        Self::new([
            BadgeDefinition::keyed(BadgeId::LevelMilestone, "trophy"),
            BadgeDefinition::keyed(BadgeId::FirstTask, "seedling"),
            BadgeDefinition::keyed(BadgeId::TaskCollector, "basket"),
            BadgeDefinition::keyed(BadgeId::LoggerNovice, "notebook"),
            BadgeDefinition::keyed(BadgeId::LoggerMaster, "journal"),
            BadgeDefinition::keyed(BadgeId::Explorer, "compass"),
        ])
    }

    pub fn get(&self, id: BadgeId) -> Option<&BadgeDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    pub fn contains(&self, id: BadgeId) -> bool {
        self.get(id).is_some()
    }

    /// Definitions in registration order
    pub fn iter(&self) -> impl Iterator<Item = &BadgeDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
