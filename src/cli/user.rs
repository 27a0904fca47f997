//! User management commands

use anyhow::Result;
use clap::Subcommand;

use super::Context;
use verdant::UserId;

#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a gardener
    Add {
        id: String,

        /// Display name
        #[arg(long)]
        name: Option<String>,
    },

    /// Remove a gardener with all their records, experience and badges
    Remove { id: String },
}

pub fn user_command(ctx: &Context, command: UserCommands) -> Result<()> {
    let config = ctx.config()?;
    let stats = ctx.open_stats(&config)?;
    let recorder = stats.recorder();

    match command {
        UserCommands::Add { id, name } => {
            recorder.add_user(&UserId::from(id.as_str()), name.as_deref())?;
            println!("Added {}", id);
        }
        UserCommands::Remove { id } => {
            if recorder.remove_user(&UserId::from(id.as_str()))? {
                println!("Removed {}", id);
            } else {
                println!("No such user: {}", id);
            }
        }
    }
    Ok(())
}
