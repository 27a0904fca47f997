//! Init command implementation

use anyhow::Result;

use super::Context;
use verdant::Config;

/// Write the default configuration file
pub fn init_command(ctx: &Context, force: bool) -> Result<()> {
    let path = ctx
        .config_path
        .clone()
        .unwrap_or_else(Config::global_config_path);

    if Config::default().init_at(&path, force)? {
        println!("Created {}", path.display());
    } else {
        println!("Config file already exists: {}", path.display());
        println!("Use --force to overwrite");
    }
    Ok(())
}
