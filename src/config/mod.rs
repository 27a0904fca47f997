//! Configuration loading and management

mod io;
mod settings;

pub use settings::{
    CelebrationSettings, DatabaseSettings, EngineSettings, NotificationSettings,
};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,

    #[serde(default)]
    pub celebration: CelebrationSettings,
}

impl Config {
    /// Database path, falling back to ~/.verdant/garden.db
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| Self::global_config_dir().join("garden.db"))
    }
}
