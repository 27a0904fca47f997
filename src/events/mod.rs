//! Achievement event delivery
//!
//! The engine publishes one [`AchievementUpdated`] per committed award on an
//! [`EventBus`]. Subscribers shipped here:
//!
//! - [`NotificationScheduler`]: level-up and badge local notifications
//! - [`CelebrationOverlay`]: transient confetti/banner state
//! - [`SummaryBanner`]: latest per-user progress summary

mod banner;
mod bus;
mod notifications;
mod overlay;

pub use banner::{BannerSummary, SummaryBanner};
pub use bus::{AchievementSubscriber, AchievementUpdated, EventBus, Subscription};
pub use notifications::{
    LocalNotification, NotificationKind, NotificationScheduler, NotificationSink, TracingSink,
};
pub use overlay::{Celebration, CelebrationOverlay};
