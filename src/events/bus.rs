//! In-process event bus with one unbounded queue per subscriber.
//!
//! [`EventBus`] fans each [`AchievementUpdated`] out to every registered
//! [`AchievementSubscriber`]. Publishing never waits on subscribers: each one
//! drains its own queue in its own task, so a slow subscriber falls behind
//! without losing events, and a failing or panicking subscriber only loses
//! the event it failed on.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::stats::{BadgeId, UserId};

/// Published once per committed award
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementUpdated {
    pub user_id: UserId,
    pub experience: u64,
    pub level: u32,
    pub leveled_up: bool,
    pub new_badges: Vec<BadgeId>,
}

impl AchievementUpdated {
    /// Whether this event is worth celebrating (level-up or new badges)
    pub fn is_celebration(&self) -> bool {
        self.leveled_up || !self.new_badges.is_empty()
    }
}

/// Consumer of achievement events
pub trait AchievementSubscriber: Send + Sync + 'static {
    /// Name used in logs
    fn name(&self) -> &str;

    fn on_achievement(&self, event: &AchievementUpdated) -> anyhow::Result<()>;
}

/// In-process fan-out event bus.
///
/// `None` once closed.
pub struct EventBus {
    senders: Mutex<Option<Vec<UnboundedSender<AchievementUpdated>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            senders: Mutex::new(Some(Vec::new())),
        }
    }

    fn senders(&self) -> MutexGuard<'_, Option<Vec<UnboundedSender<AchievementUpdated>>>> {
        match self.senders.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Queue an event for every live subscriber.
    ///
    /// Returns the number of queues the event was pushed to. Zero receivers,
    /// or a closed bus, is not an error. Queues whose receiver is gone are
    /// dropped here.
    pub fn publish(&self, event: AchievementUpdated) -> usize {
        let mut guard = self.senders();
        let Some(senders) = guard.as_mut() else {
            debug!(user = %event.user_id, "Event bus closed, dropping achievement event");
            return 0;
        };
        senders.retain(|sender| sender.send(event.clone()).is_ok());
        senders.len()
    }

    /// Raw receiver for callers that drive delivery themselves.
    ///
    /// Receives every event published after this call until the bus closes.
    pub fn receiver(&self) -> Option<UnboundedReceiver<AchievementUpdated>> {
        let mut guard = self.senders();
        let senders = guard.as_mut()?;
        let (tx, rx) = mpsc::unbounded_channel();
        senders.push(tx);
        Some(rx)
    }

    /// Register a subscriber. Must be called inside a tokio runtime.
    ///
    /// Events published before this call are not delivered to it.
    pub fn subscribe(&self, subscriber: Arc<dyn AchievementSubscriber>) -> Option<Subscription> {
        let mut rx = self.receiver()?;
        let name = subscriber.name().to_string();

        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                deliver(subscriber.as_ref(), &event);
            }
            debug!(subscriber = %subscriber.name(), "Subscriber stopped");
        });

        Some(Subscription { name, handle })
    }

    /// Stop accepting events. Subscribers drain what is already queued, then finish.
    pub fn close(&self) {
        self.senders().take();
    }

    pub fn is_closed(&self) -> bool {
        self.senders().is_none()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

fn deliver(subscriber: &dyn AchievementSubscriber, event: &AchievementUpdated) {
    match catch_unwind(AssertUnwindSafe(|| subscriber.on_achievement(event))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            warn!(subscriber = %subscriber.name(), user = %event.user_id, "Subscriber failed: {:#}", e);
        }
        Err(_) => {
            error!(subscriber = %subscriber.name(), user = %event.user_id, "Subscriber panicked");
        }
    }
}

/// Handle to a running subscriber task
pub struct Subscription {
    name: String,
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait until the subscriber has drained the closed bus
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            error!(subscriber = %self.name, "Subscriber task ended abnormally: {}", e);
        }
    }
}
