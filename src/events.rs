//! Feed lifecycle events fanned out to live sessions and the scheduler's
//! observers.

use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FeedEvent {
    /// A new snapshot was stored.
    Refreshed { items: usize, real: bool },
    /// A scheduled or manual refresh produced nothing; old data is kept.
    RefreshFailed { message: String },
    /// The update check saw items upstream that are not loaded yet.
    UpdatesAvailable { count: usize },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<FeedEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.tx.subscribe()
    }

    /// Fire and forget; having no subscribers is fine.
    pub fn publish(&self, ev: FeedEvent) {
        tracing::debug!(target: "events", event = ?ev, receivers = self.tx.receiver_count(), "publish");
        let _ = self.tx.send(ev);
    }
}
