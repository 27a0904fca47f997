//! Status command implementation

use anyhow::{Result, bail};
use serde::Serialize;

use super::Context;
use verdant::stats::{BadgeRegistry, BadgeUnlock, StatsQuery, UserId, UserProgress};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    user_id: UserId,
    #[serde(flatten)]
    progress: UserProgress,
    badges: Vec<BadgeUnlock>,
}

/// Show level, experience and badges for one user
pub fn status_command(ctx: &Context, user: &str, json: bool) -> Result<()> {
    let config = ctx.config()?;
    let stats = ctx.open_stats(&config)?;
    let query: StatsQuery = stats.query();
    let user = UserId::from(user);

    if !query.user_exists(&user)? {
        bail!("Unknown user '{}'. Add it with `verdant user add {}`", user, user);
    }

    let experience = query.load_stats(&user)?.map(|s| s.experience).unwrap_or(0);
    let report = StatusReport {
        progress: UserProgress::new(experience),
        badges: query.unlocked_badges(&user)?,
        user_id: user,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let p = &report.progress;
    println!("{} - Level {}", report.user_id, p.level);
    println!(
        "  [{}] {}/{} XP ({} to next level)",
        progress_bar(p.progress, 20),
        p.experience,
        p.next_level_xp,
        p.xp_remaining()
    );

    let registry = BadgeRegistry::builtin();
    if report.badges.is_empty() {
        println!("  No badges yet.");
    } else {
        println!("  Badges ({}/{}):", report.badges.len(), registry.len());
        for unlock in &report.badges {
            let icon = registry
                .get(unlock.badge)
                .map(|d| d.icon.as_str())
                .unwrap_or("badge");
            println!(
                "    {:<9} {:<16} {}",
                icon,
                unlock.badge.as_str(),
                unlock.unlocked_at.format("%Y-%m-%d %H:%M")
            );
        }
    }
    Ok(())
}

fn progress_bar(progress: f64, width: usize) -> String {
    let filled = ((progress.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use verdant::Config;

    fn context(dir: &std::path::Path) -> Context {
        let config_path = dir.join("config.toml");
        Config::default().save_to_file(&config_path).unwrap();
        Context {
            config_path: Some(config_path),
            db_path: Some(dir.join("garden.db")),
        }
    }

    #[test]
    fn test_unknown_user_is_an_error() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());

        let err = status_command(&ctx, "ghost", false).unwrap_err();
        assert!(err.to_string().contains("Unknown user 'ghost'"));
    }

    #[test]
    fn test_known_user_reports_status() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());
        let stats = ctx.open_stats(&ctx.config().unwrap()).unwrap();
        stats.recorder().add_user(&UserId::from("ana"), None).unwrap();

        status_command(&ctx, "ana", true).unwrap();
    }

    #[test]
    fn test_progress_bar_width() {
        assert_eq!(progress_bar(0.0, 10), "----------");
        assert_eq!(progress_bar(0.5, 10), "#####-----");
        assert_eq!(progress_bar(1.5, 10), "##########");
    }
}
