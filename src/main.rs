use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "verdant")]
#[command(about = "Garden progression - experience, levels and badges")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.verdant/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database (overrides [database] path)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Manage gardeners
    User {
        #[command(subcommand)]
        command: cli::user::UserCommands,
    },

    /// Record a task and award its experience
    Task {
        user: String,
        title: String,
    },

    /// Record a crop progress log and award its experience
    Log {
        user: String,
        note: String,

        /// Crop the log belongs to
        #[arg(long)]
        crop: Option<String>,
    },

    /// Accept a recommendation and award its experience
    Recommend { user: String },

    /// Show level, experience and badges for a gardener
    Status {
        user: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List all badges
    Badges,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let ctx = cli::Context {
        config_path: cli.config,
        db_path: cli.db,
    };

    match cli.command {
        Commands::Init { force } => {
            cli::init::init_command(&ctx, force)?;
        }
        Commands::User { command } => {
            cli::user::user_command(&ctx, command)?;
        }
        Commands::Task { user, title } => {
            cli::award::task_command(&ctx, &user, &title).await?;
        }
        Commands::Log { user, note, crop } => {
            cli::award::log_command(&ctx, &user, &note, crop.as_deref()).await?;
        }
        Commands::Recommend { user } => {
            cli::award::recommend_command(&ctx, &user).await?;
        }
        Commands::Status { user, json } => {
            cli::status::status_command(&ctx, &user, json)?;
        }
        Commands::Badges => {
            cli::badges::badges_command();
        }
    }

    Ok(())
}
