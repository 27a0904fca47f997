//! Award commands: record the garden action, then run it through the engine

use std::sync::Arc;

use anyhow::{Result, bail};

use super::Context;
use verdant::config::Config;
use verdant::events::{
    CelebrationOverlay, EventBus, NotificationScheduler, SummaryBanner, Subscription, TracingSink,
};
use verdant::stats::{AchievementAction, AchievementManager, AchievementResult, StatsManager, UserId};

/// Engine plus the subscribers listening to it for the duration of one command
struct Session {
    stats: StatsManager,
    engine: AchievementManager,
    overlay: Arc<CelebrationOverlay>,
    banner: Arc<SummaryBanner>,
    subscriptions: Vec<Subscription>,
}

impl Session {
    fn open(ctx: &Context) -> Result<Self> {
        let config = ctx.config()?;
        let stats = ctx.open_stats(&config)?;
        let bus = Arc::new(EventBus::new());
        let engine = stats
            .achievements(bus.clone())?
            .with_max_commit_attempts(config.engine.max_commit_attempts);

        let (overlay, banner, subscriptions) = wire_subscribers(&config, &engine, &bus);
        Ok(Self {
            stats,
            engine,
            overlay,
            banner,
            subscriptions,
        })
    }

    fn require_user(&self, user: &UserId) -> Result<()> {
        if !self.stats.query().user_exists(user)? {
            bail!("Unknown user '{}'. Add it with `verdant user add {}`", user, user);
        }
        Ok(())
    }

    fn award(&self, action: AchievementAction, user: &UserId) -> Result<AchievementResult> {
        Ok(self.engine.award(action, user)?)
    }

    /// Close the bus and wait for subscribers to drain
    async fn finish(self, user: &UserId) {
        self.engine.bus().close();
        for subscription in self.subscriptions {
            subscription.join().await;
        }

        if let Some(celebration) = self.overlay.visible() {
            if celebration.leveled_up {
                println!("*** Level {} reached! ***", celebration.level);
            }
            for badge in &celebration.badges {
                let icon = self
                    .engine
                    .registry()
                    .get(*badge)
                    .map(|d| d.icon.as_str())
                    .unwrap_or("badge");
                println!("*** Badge unlocked: {} ({}) ***", badge, icon);
            }
        }
        if let Some(summary) = self.banner.summary_for(user) {
            println!(
                "Level {} - {}/{} XP ({:.0}%)",
                summary.progress.level,
                summary.progress.experience,
                summary.progress.next_level_xp,
                summary.progress.progress * 100.0
            );
        }
    }
}

fn wire_subscribers(
    config: &Config,
    engine: &AchievementManager,
    bus: &EventBus,
) -> (Arc<CelebrationOverlay>, Arc<SummaryBanner>, Vec<Subscription>) {
    let scheduler = Arc::new(NotificationScheduler::new(
        Arc::new(TracingSink),
        engine.registry().clone(),
        config.notifications.clone(),
    ));
    let overlay = Arc::new(CelebrationOverlay::new(config.celebration.display_for()));
    let banner = Arc::new(SummaryBanner::new());

    let subscriptions = [
        bus.subscribe(scheduler),
        bus.subscribe(overlay.clone()),
        bus.subscribe(banner.clone()),
    ]
    .into_iter()
    .flatten()
    .collect();

    (overlay, banner, subscriptions)
}

fn print_result(action: AchievementAction, result: &AchievementResult) {
    println!("{}: {} XP total, level {}", action, result.experience, result.level);
    if !result.new_badges.is_empty() {
        let names: Vec<_> = result.new_badges.iter().map(|b| b.as_str()).collect();
        println!("New badges: {}", names.join(", "));
    }
}

async fn run(
    ctx: &Context,
    user: &str,
    action: AchievementAction,
    record: impl FnOnce(&StatsManager, &UserId) -> Result<()>,
) -> Result<()> {
    let user = UserId::from(user);
    let session = Session::open(ctx)?;
    session.require_user(&user)?;

    record(&session.stats, &user)?;
    let result = session.award(action, &user);
    if let Ok(result) = &result {
        print_result(action, result);
    }
    session.finish(&user).await;
    result.map(|_| ())
}

/// Record a task and award `createTask`
pub async fn task_command(ctx: &Context, user: &str, title: &str) -> Result<()> {
    run(ctx, user, AchievementAction::CreateTask, |stats, user| {
        let task = stats.recorder().record_task(user, title)?;
        println!("Recorded task {}", task.id);
        Ok(())
    })
    .await
}

/// Record a progress log and award `addProgressLog`
pub async fn log_command(ctx: &Context, user: &str, note: &str, crop: Option<&str>) -> Result<()> {
    run(ctx, user, AchievementAction::AddProgressLog, |stats, user| {
        let log = stats.recorder().record_progress_log(user, crop, note)?;
        println!("Recorded progress log {}", log.id);
        Ok(())
    })
    .await
}

/// Award `acceptRecommendation`
pub async fn recommend_command(ctx: &Context, user: &str) -> Result<()> {
    run(ctx, user, AchievementAction::AcceptRecommendation, |_, _| Ok(())).await
}
