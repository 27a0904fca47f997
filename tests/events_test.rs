//! Event publication around committed and failed awards

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::Garden;
use tokio::sync::mpsc::error::TryRecvError;
use verdant::config::NotificationSettings;
use verdant::events::{
    AchievementSubscriber, AchievementUpdated, CelebrationOverlay, EventBus, LocalNotification, NotificationKind,
    NotificationScheduler, NotificationSink, SummaryBanner,
};
use verdant::stats::{
    AchievementAction, AchievementManager, AchievementStore, AwardCommit, AwardError, BadgeId,
    BadgeRegistry, BadgeRuleSet, BadgeUnlock, StatsDb, StoreError, UserId, UserStats,
};

/// Delegates reads to a real database and refuses every commit
struct RefusingStore {
    inner: StatsDb,
}

impl AchievementStore for RefusingStore {
    fn load_stats(&self, user: &UserId) -> Result<Option<UserStats>, StoreError> {
        self.inner.load_stats(user)
    }

    fn unlocked_badges(&self, user: &UserId) -> Result<Vec<BadgeUnlock>, StoreError> {
        self.inner.unlocked_badges(user)
    }

    fn commit(&self, _commit: &AwardCommit) -> Result<Vec<BadgeId>, StoreError> {
        Err(StoreError::Corrupt("disk full".to_string()))
    }
}

#[derive(Default)]
struct RecordingSink {
    scheduled: Mutex<Vec<LocalNotification>>,
}

impl NotificationSink for RecordingSink {
    fn schedule(&self, notification: LocalNotification) -> anyhow::Result<()> {
        self.scheduled.lock().unwrap().push(notification);
        Ok(())
    }
}

#[test]
fn test_committed_award_publishes_matching_event() {
    let garden = Garden::new();
    let mut rx = garden.bus.receiver().unwrap();

    let result = garden.create_task("Water tomatoes");
    let event = rx.try_recv().unwrap();

    assert_eq!(
        event,
        AchievementUpdated {
            user_id: garden.user.clone(),
            experience: result.experience,
            level: result.level,
            leveled_up: result.leveled_up,
            new_badges: result.new_badges.clone(),
        }
    );
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[test]
fn test_unknown_user_publishes_nothing() {
    let garden = Garden::new();
    let mut rx = garden.bus.receiver().unwrap();

    garden
        .engine
        .award(AchievementAction::CreateTask, &UserId::from("ghost"))
        .unwrap();
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[test]
fn test_failed_commit_publishes_nothing_and_stores_nothing() {
    let garden = Garden::new();
    garden
        .stats
        .recorder()
        .record_task(&garden.user, "Sow beans")
        .unwrap();

    let db = garden.reopen();
    let db_arc = Arc::new(db.clone());
    let bus = Arc::new(EventBus::default());
    let rules = BadgeRuleSet::standard(Arc::new(BadgeRegistry::builtin())).unwrap();
    let engine = AchievementManager::new(
        db_arc.clone(),
        db_arc,
        Arc::new(RefusingStore { inner: db }),
        rules,
        bus.clone(),
    );
    let mut rx = bus.receiver().unwrap();

    let err = engine
        .award(AchievementAction::CreateTask, &garden.user)
        .unwrap_err();
    let AwardError::Persistence { attempts, source, .. } = err;
    assert_eq!(attempts, 1);
    assert!(matches!(source, StoreError::Corrupt(_)));

    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(garden.stored_experience(), 0);
    assert!(garden.engine.unlocked_badges(&garden.user).unwrap().is_empty());
}

#[tokio::test]
async fn test_subscribers_see_award_after_close() {
    let garden = Garden::new();
    let sink = Arc::new(RecordingSink::default());
    let scheduler = Arc::new(NotificationScheduler::new(
        sink.clone(),
        garden.engine.registry().clone(),
        NotificationSettings::default(),
    ));
    let overlay = Arc::new(CelebrationOverlay::new(Duration::from_secs(60)));
    let banner = Arc::new(SummaryBanner::new());

    let subscriptions: Vec<_> = [
        garden.bus.subscribe(scheduler),
        garden.bus.subscribe(overlay.clone()),
        garden.bus.subscribe(banner.clone()),
    ]
    .into_iter()
    .flatten()
    .collect();
    assert_eq!(subscriptions.len(), 3);

    // 350 XP, then the 8th task reaches level 3 with first_task still pending
    for _ in 0..7 {
        garden.award(AchievementAction::CreateTask);
    }
    let result = garden.create_task("Harvest basil");
    assert!(result.leveled_up);
    assert_eq!(
        result.new_badges,
        vec![BadgeId::LevelMilestone, BadgeId::FirstTask]
    );

    garden.bus.close();
    for subscription in subscriptions {
        subscription.join().await;
    }

    let scheduled = sink.scheduled.lock().unwrap().clone();
    assert_eq!(scheduled.len(), 3);
    assert_eq!(scheduled[1].kind, NotificationKind::LevelUp { level: 3 });
    assert!(matches!(
        scheduled[2].kind,
        NotificationKind::BadgeUnlocked {
            badge: BadgeId::LevelMilestone,
            additional: 1,
            ..
        }
    ));

    let celebration = overlay.visible().unwrap();
    assert_eq!(celebration.level, 3);
    assert_eq!(celebration.badges, result.new_badges);

    let summary = banner.summary_for(&garden.user).unwrap();
    assert_eq!(summary.progress.experience, 400);
    assert_eq!(summary.recent_badges, result.new_badges);

    // Closed bus: awards still commit, nothing is delivered
    assert!(garden.bus.is_closed());
    let after = garden.award(AchievementAction::CreateTask);
    assert_eq!(after.experience, 450);
}

/// Sleeps on every event so awards outpace it
struct SlowCounter {
    experience: Mutex<Vec<u64>>,
}

impl AchievementSubscriber for SlowCounter {
    fn name(&self) -> &str {
        "slow-counter"
    }

    fn on_achievement(&self, event: &AchievementUpdated) -> anyhow::Result<()> {
        std::thread::sleep(Duration::from_millis(10));
        self.experience.lock().unwrap().push(event.experience);
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_burst_of_awards_reaches_slow_subscriber_in_full() {
    let garden = Garden::new();
    let slow = Arc::new(SlowCounter {
        experience: Mutex::new(Vec::new()),
    });
    let subscription = garden.bus.subscribe(slow.clone()).unwrap();

    for _ in 0..40 {
        garden.award(AchievementAction::AddProgressLog);
    }
    garden.bus.close();
    subscription.join().await;

    let seen = slow.experience.lock().unwrap().clone();
    assert_eq!(seen, (1..=40).map(|n| n * 20).collect::<Vec<u64>>());
}
