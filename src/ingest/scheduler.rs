// src/ingest/scheduler.rs
use metrics::{counter, gauge};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::error::LoadError;
use crate::events::{EventBus, FeedEvent};
use crate::ingest::FallbackLoader;
use crate::item::ItemId;
use crate::store::{ItemStore, Snapshot};

#[derive(Clone, Copy, Debug)]
pub struct FeedSchedulerCfg {
    pub refresh_interval_secs: u64,
    pub update_check_secs: u64,
}

/// Reload through the fallback chain and swap the store on success. On
/// failure the previous snapshot stays in place.
pub async fn refresh_store(
    loader: &FallbackLoader,
    store: &ItemStore,
    events: &EventBus,
) -> Result<Arc<Snapshot>, LoadError> {
    match loader.load().await {
        Ok(snap) => {
            let items = snap.items.len();
            let real = snap.origin.is_real();
            let snap = store.replace(snap);
            events.publish(FeedEvent::Refreshed { items, real });
            Ok(snap)
        }
        Err(e) => {
            events.publish(FeedEvent::RefreshFailed {
                message: e.to_string(),
            });
            Err(e)
        }
    }
}

/// Ids present in `fresh` but not in `current`, in `fresh` order.
pub fn new_item_ids(current: &Snapshot, fresh: &Snapshot) -> Vec<ItemId> {
    let known = current.ids();
    fresh
        .items
        .iter()
        .filter(|it| !known.contains(&it.id))
        .map(|it| it.id.clone())
        .collect()
}

/// Owns the periodic refresh and update-check tasks. Dropping it (or calling
/// `shutdown`) aborts both.
pub struct ScheduledTasks {
    refresh: Option<JoinHandle<()>>,
    update_check: Option<JoinHandle<()>>,
}

impl ScheduledTasks {
    pub fn is_running(&self) -> bool {
        [&self.refresh, &self.update_check]
            .iter()
            .any(|h| h.as_ref().is_some_and(|h| !h.is_finished()))
    }

    pub fn shutdown(&mut self) {
        for h in [self.refresh.take(), self.update_check.take()].into_iter().flatten() {
            h.abort();
        }
    }
}

impl Drop for ScheduledTasks {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawn the auto-refresh and update-check loops. The first tick of each is
/// skipped: the caller has just loaded.
pub fn spawn_feed_tasks(
    cfg: FeedSchedulerCfg,
    loader: Arc<FallbackLoader>,
    store: ItemStore,
    events: EventBus,
) -> ScheduledTasks {
    let refresh = {
        let (loader, store, events) = (loader.clone(), store.clone(), events.clone());
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(cfg.refresh_interval_secs.max(1)));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                counter!("feed_refresh_runs_total").increment(1);
                match refresh_store(&loader, &store, &events).await {
                    Ok(snap) => tracing::info!(
                        target: "scheduler",
                        items = snap.items.len(),
                        origin = snap.origin.label(),
                        "auto refresh"
                    ),
                    Err(e) => tracing::warn!(target: "scheduler", error = %e, "auto refresh failed"),
                }
            }
        })
    };

    let update_check = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(cfg.update_check_secs.max(1)));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(current) = store.current() else {
                continue;
            };
            let fresh = match loader.load().await {
                Ok(s) => s,
                Err(e) => {
                    tracing::debug!(target: "scheduler", error = %e, "update check load failed");
                    continue;
                }
            };
            // a mock fallback while real sources are down carries no news
            if current.origin.is_real() && !fresh.origin.is_real() {
                tracing::debug!(target: "scheduler", "update check fell back to mock data, skipped");
                continue;
            }
            let added = new_item_ids(&current, &fresh);
            store.set_pending_new(added.len());
            gauge!("feed_pending_new_items").set(added.len() as f64);
            if !added.is_empty() {
                tracing::info!(target: "scheduler", count = added.len(), "updates available");
                events.publish(FeedEvent::UpdatesAvailable { count: added.len() });
            }
        }
    });

    ScheduledTasks {
        refresh: Some(refresh),
        update_check: Some(update_check),
    }
}
