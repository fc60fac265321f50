//! # Live Feed
//! An interactive session around [`FeedController`]: search input is
//! debounced, scroll-driven paging is throttled, and every recompute is
//! published on a watch channel for the rendering side.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Duration;

use crate::config::FeedConfig;
use crate::controller::{Action, FeedController, Update};
use crate::error::LoadError;
use crate::events::{EventBus, FeedEvent};
use crate::filter::CategoryFilter;
use crate::ingest::scheduler::refresh_store;
use crate::ingest::FallbackLoader;
use crate::pipeline::{FilterState, Pipeline};
use crate::session::{self, SavedSession};
use crate::sort::SortKey;
use crate::store::ItemStore;
use crate::timing::{Debouncer, Throttle};

type Shared = Arc<Mutex<FeedController>>;

fn lock(c: &Shared) -> MutexGuard<'_, FeedController> {
    c.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn publish(tx: &watch::Sender<Option<Update>>, up: Option<Update>) {
    if let Some(up) = up {
        tx.send_replace(Some(up));
    }
}

pub struct LiveFeed {
    controller: Shared,
    updates: watch::Sender<Option<Update>>,
    search: Debouncer<String>,
    scroll: Throttle,
    session_path: Option<PathBuf>,
    follower: Option<JoinHandle<()>>,
}

impl LiveFeed {
    /// Must be created inside a tokio runtime.
    pub fn new(controller: FeedController, search_delay: Duration, scroll_window: Duration) -> Self {
        let controller = Arc::new(Mutex::new(controller));
        let (updates, _rx) = watch::channel(None);

        let search = {
            let ctl = controller.clone();
            let tx = updates.clone();
            Debouncer::new(search_delay, move |q: String| {
                let up = lock(&ctl).dispatch(Action::SetQuery(q));
                publish(&tx, up);
            })
        };

        Self {
            controller,
            updates,
            search,
            scroll: Throttle::new(scroll_window),
            session_path: None,
            follower: None,
        }
    }

    /// Session with the configured page size, default sort, search fields,
    /// timing windows and session file.
    pub fn from_config(cfg: &FeedConfig) -> Self {
        let state = FilterState {
            sort: cfg.default_sort,
            ..FilterState::with_page_size(cfg.page_size)
        };
        let controller = FeedController::new(Pipeline::new(cfg.fields()), state);
        Self::new(
            controller,
            Duration::from_millis(cfg.search_debounce_ms),
            Duration::from_millis(cfg.scroll_throttle_ms),
        )
        .with_session_path(cfg.session_path.clone())
    }

    /// Persist the selection to `path` on [`LiveFeed::save_session`].
    pub fn with_session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_path = Some(path.into());
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Update>> {
        self.updates.subscribe()
    }

    pub fn current(&self) -> Option<Update> {
        lock(&self.controller).view()
    }

    pub fn controller(&self) -> MutexGuard<'_, FeedController> {
        lock(&self.controller)
    }

    /// Load through the fallback chain into `store`, then recompute.
    /// Ignored while another load is in flight.
    pub async fn reload(
        &self,
        loader: &FallbackLoader,
        store: &ItemStore,
        events: &EventBus,
    ) -> Option<Update> {
        if !lock(&self.controller).begin_load() {
            return None;
        }
        let result = refresh_store(loader, store, events).await;
        let up = lock(&self.controller).finish_load(result);
        self.updates.send_replace(Some(up.clone()));
        Some(up)
    }

    /// Pick up whatever `store` already holds.
    pub fn attach(&self, store: &ItemStore) -> Update {
        let mut c = lock(&self.controller);
        c.begin_load();
        let up = c.finish_load(store.current().ok_or(LoadError::NoSources));
        drop(c);
        self.updates.send_replace(Some(up.clone()));
        up
    }

    /// Recompute whenever the store is refreshed elsewhere (scheduler, API).
    pub fn follow(&mut self, events: &EventBus, store: ItemStore) {
        let mut rx = events.subscribe();
        let ctl = self.controller.clone();
        let tx = self.updates.clone();
        if let Some(h) = self.follower.take() {
            h.abort();
        }
        self.follower = Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(FeedEvent::Refreshed { .. }) => {
                        let Some(snap) = store.current() else { continue };
                        let up = {
                            let mut c = lock(&ctl);
                            c.begin_load();
                            c.finish_load(Ok(snap))
                        };
                        tx.send_replace(Some(up));
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::debug!(target: "live", skipped = n, "event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }

    /// Keystroke in the search box. Applied once typing pauses.
    pub fn search_input(&mut self, text: impl Into<String>) {
        self.search.call(text.into());
    }

    pub fn set_category(&self, category: CategoryFilter) -> Option<Update> {
        self.apply(Action::SetCategory(category))
    }

    pub fn set_sort(&self, sort: SortKey) -> Option<Update> {
        self.apply(Action::SetSort(sort))
    }

    /// Scroll position report. Loads the next page when near the bottom, at
    /// most once per throttle window.
    pub fn on_scroll(&mut self, near_bottom: bool) -> Option<Update> {
        if !near_bottom || !self.scroll.try_fire() {
            return None;
        }
        self.apply(Action::LoadMore)
    }

    /// Explicit "load more" button; not throttled.
    pub fn load_more(&self) -> Option<Update> {
        self.apply(Action::LoadMore)
    }

    /// Reapply the saved selection, if a session file is set. A missing or
    /// unreadable file leaves the defaults in place.
    pub async fn restore_session(&self) -> Option<Update> {
        let path = self.session_path.as_deref()?;
        let saved = session::load(path).await;
        let mut c = lock(&self.controller);
        let next = saved.apply(c.state());
        tracing::debug!(target: "live", category = %next.category, sort = %next.sort, "session restored");
        let up = c.restore(next);
        drop(c);
        publish(&self.updates, up.clone());
        up
    }

    pub async fn save_session(&self) {
        let Some(path) = self.session_path.as_deref() else {
            return;
        };
        let saved = SavedSession::from_state(lock(&self.controller).state());
        session::save(path, &saved).await;
    }

    fn apply(&self, action: Action) -> Option<Update> {
        let up = lock(&self.controller).dispatch(action);
        publish(&self.updates, up.clone());
        up
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.search.cancel();
        if let Some(h) = self.follower.take() {
            h.abort();
        }
    }
}
