//! CLI command implementations

pub mod award;
pub mod badges;
pub mod init;
pub mod status;
pub mod user;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use verdant::Config;
use verdant::stats::StatsManager;

/// Global flags shared by every command
pub struct Context {
    pub config_path: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
}

impl Context {
    pub fn config(&self) -> Result<Config> {
        Config::load_from(self.config_path.as_deref())
    }

    /// Open the database named by `--db`, else by the config
    pub fn open_stats(&self, config: &Config) -> Result<StatsManager> {
        let path = self
            .db_path
            .clone()
            .unwrap_or_else(|| config.database_path());
        StatsManager::with_path(&path)
            .with_context(|| format!("Failed to open database: {}", path.display()))
    }
}
