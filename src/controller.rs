//! # Feed Controller
//! Drives one feed session: owns the [`FilterState`], tracks the load phase,
//! and re-runs the pipeline whenever an action changes what should be shown.
//!
//! State changes go through the pure [`reduce`]; the controller only decides
//! *whether* to recompute and caches the ordered view so "load more" can
//! re-slice it without filtering, searching and sorting again.

use serde::Serialize;
use std::sync::Arc;

use crate::error::LoadError;
use crate::filter::CategoryFilter;
use crate::item::NewsItem;
use crate::paginate::{paginate, PageResult};
use crate::pipeline::{signals_for, FilterState, Pipeline, Signal};
use crate::sort::SortKey;
use crate::store::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetCategory(CategoryFilter),
    SetQuery(String),
    SetSort(SortKey),
    SetPageSize(usize),
    LoadMore,
}

/// Pure state transition. Every change resets to page 1, except `LoadMore`
/// which advances one page.
pub fn reduce(state: &FilterState, action: &Action) -> FilterState {
    let mut next = state.clone();
    match action {
        Action::SetCategory(c) => next.category = c.clone(),
        Action::SetQuery(q) => next.query = q.clone(),
        Action::SetSort(s) => next.sort = *s,
        Action::SetPageSize(n) => next.page_size = (*n).max(1),
        Action::LoadMore => {
            next.page = state.page.saturating_add(1);
            return next;
        }
    }
    next.page = 1;
    next
}

/// What the rendering side receives after a recompute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Update {
    pub phase: Phase,
    pub state: FilterState,
    pub page: PageResult,
    pub signals: Vec<Signal>,
}

#[derive(Debug)]
pub struct FeedController {
    pipeline: Pipeline,
    state: FilterState,
    phase: Phase,
    snapshot: Option<Arc<Snapshot>>,
    ordered: Vec<NewsItem>,
    last_page: Option<PageResult>,
    last_error: Option<LoadError>,
}

impl FeedController {
    pub fn new(pipeline: Pipeline, state: FilterState) -> Self {
        Self {
            pipeline,
            state,
            phase: Phase::Idle,
            snapshot: None,
            ordered: Vec::new(),
            last_page: None,
            last_error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        self.snapshot.as_ref()
    }

    pub fn last_error(&self) -> Option<&LoadError> {
        self.last_error.as_ref()
    }

    /// Filtered and sorted items from page 1 through the current page, i.e.
    /// everything an infinite-scroll view has shown so far.
    pub fn visible(&self) -> &[NewsItem] {
        let end = self
            .state
            .page
            .saturating_mul(self.state.page_size)
            .min(self.ordered.len());
        &self.ordered[..end]
    }

    /// Enter `Loading`. Returns false if a load is already in flight.
    pub fn begin_load(&mut self) -> bool {
        if self.phase == Phase::Loading {
            return false;
        }
        tracing::debug!(target: "controller", from = ?self.phase, "begin load");
        self.phase = Phase::Loading;
        true
    }

    /// Retry after a failed load. Only valid from `Error`.
    pub fn retry(&mut self) -> bool {
        self.phase == Phase::Error && self.begin_load()
    }

    /// Complete a load. A successful load replaces the data and recomputes with
    /// the current state (page included); a failure moves to `Error` and keeps
    /// whatever was shown before.
    pub fn finish_load(&mut self, result: Result<Arc<Snapshot>, LoadError>) -> Update {
        match result {
            Ok(snap) => {
                self.snapshot = Some(snap);
                self.last_error = None;
                self.recompute()
            }
            Err(err) => {
                tracing::warn!(target: "controller", error = %err, "load failed");
                self.phase = Phase::Error;
                let message = err.to_string();
                self.last_error = Some(err);
                let page = self
                    .last_page
                    .clone()
                    .unwrap_or_else(|| paginate(&[], self.state.page, self.state.page_size));
                Update {
                    phase: self.phase,
                    state: self.state.clone(),
                    page,
                    signals: vec![Signal::LoadFailed { message }],
                }
            }
        }
    }

    /// Apply a user action. Returns `None` when nothing needs re-rendering:
    /// "load more" while loading or past the last page, or any action before
    /// data is available (the state still changes and applies on the next load).
    pub fn dispatch(&mut self, action: Action) -> Option<Update> {
        if action == Action::LoadMore {
            let exhausted = self.last_page.as_ref().map_or(true, |p| !p.has_next);
            if self.phase != Phase::Ready || exhausted {
                tracing::debug!(target: "controller", phase = ?self.phase, exhausted, "load more ignored");
                return None;
            }
            self.state = reduce(&self.state, &action);
            return Some(self.reslice());
        }

        self.state = reduce(&self.state, &action);
        match self.phase {
            Phase::Ready => {
                self.phase = Phase::Loading;
                Some(self.recompute())
            }
            Phase::Idle | Phase::Loading | Phase::Error => None,
        }
    }

    /// Swap in a whole state, e.g. a restored session. Recomputes under the
    /// same rules as [`FeedController::dispatch`].
    pub fn restore(&mut self, state: FilterState) -> Option<Update> {
        self.state = FilterState {
            page: state.page.max(1),
            page_size: state.page_size.max(1),
            ..state
        };
        match self.phase {
            Phase::Ready => Some(self.recompute()),
            Phase::Idle | Phase::Loading | Phase::Error => None,
        }
    }

    /// Current page without changing anything. `None` until data has loaded.
    pub fn view(&self) -> Option<Update> {
        let page = self.last_page.clone()?;
        let signals = signals_for(&page, self.state.filters_active());
        Some(Update {
            phase: self.phase,
            state: self.state.clone(),
            page,
            signals,
        })
    }

    fn recompute(&mut self) -> Update {
        let Some(snap) = self.snapshot.clone() else {
            self.phase = Phase::Idle;
            let page = paginate(&[], self.state.page, self.state.page_size);
            return Update {
                phase: self.phase,
                state: self.state.clone(),
                page,
                signals: Vec::new(),
            };
        };
        self.ordered = self
            .pipeline
            .ordered(&snap.items, &self.state)
            .into_iter()
            .cloned()
            .collect();
        self.phase = Phase::Ready;
        self.reslice()
    }

    fn reslice(&mut self) -> Update {
        let page = paginate(&self.ordered, self.state.page, self.state.page_size);
        let signals = signals_for(&page, self.state.filters_active());
        self.last_page = Some(page.clone());
        Update {
            phase: self.phase,
            state: self.state.clone(),
            page,
            signals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Category;
    use crate::store::Origin;
    use chrono::Utc;

    fn snapshot(n: u64) -> Arc<Snapshot> {
        let items = (1..=n)
            .map(|i| {
                NewsItem::new(i, format!("item {i}"))
                    .category(if i % 2 == 0 { Category::Tech } else { Category::Policy })
                    .importance(i as f64)
            })
            .collect();
        Arc::new(Snapshot::new(items, Origin::Mock, Utc::now()))
    }

    fn ready(n: u64, page_size: usize) -> FeedController {
        let mut c = FeedController::new(Pipeline::default(), FilterState::with_page_size(page_size));
        assert!(c.begin_load());
        c.finish_load(Ok(snapshot(n)));
        c
    }

    #[test]
    fn reduce_resets_page_except_for_load_more() {
        let s = FilterState {
            page: 3,
            ..FilterState::default()
        };
        assert_eq!(reduce(&s, &Action::SetQuery("x".into())).page, 1);
        assert_eq!(reduce(&s, &Action::SetSort(SortKey::Importance)).page, 1);
        assert_eq!(reduce(&s, &Action::SetCategory(Category::Tech.into())).page, 1);
        assert_eq!(reduce(&s, &Action::LoadMore).page, 4);
        // input untouched
        assert_eq!(s.page, 3);
    }

    #[test]
    fn load_lifecycle() {
        let mut c = FeedController::new(Pipeline::default(), FilterState::default());
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.begin_load());
        assert!(!c.begin_load());

        let up = c.finish_load(Err(LoadError::NoSources));
        assert_eq!(c.phase(), Phase::Error);
        assert!(matches!(up.signals[0], Signal::LoadFailed { .. }));

        assert!(c.retry());
        let up = c.finish_load(Ok(snapshot(3)));
        assert_eq!(up.phase, Phase::Ready);
        assert_eq!(up.page.total, 3);
        assert!(c.last_error().is_none());
    }

    #[test]
    fn load_more_appends_until_exhausted() {
        let mut c = ready(5, 2);
        let up = c.dispatch(Action::LoadMore).unwrap();
        assert_eq!(up.page.page, 2);
        assert_eq!(c.visible().len(), 4);

        let up = c.dispatch(Action::LoadMore).unwrap();
        assert_eq!(up.page.items.len(), 1);
        assert_eq!(up.signals, vec![Signal::NoMorePages]);

        assert!(c.dispatch(Action::LoadMore).is_none());
        assert_eq!(c.state().page, 3);
    }

    #[test]
    fn load_more_ignored_while_loading() {
        let mut c = ready(5, 2);
        assert!(c.begin_load());
        assert!(c.dispatch(Action::LoadMore).is_none());
        assert_eq!(c.state().page, 1);
    }

    #[test]
    fn filter_change_recomputes_from_page_one() {
        let mut c = ready(6, 2);
        c.dispatch(Action::LoadMore);
        let up = c
            .dispatch(Action::SetCategory(CategoryFilter::parse("tech")))
            .unwrap();
        assert_eq!(up.phase, Phase::Ready);
        assert_eq!(up.state.page, 1);
        assert_eq!(up.page.total, 3);
        assert!(up.page.items.iter().all(|it| it.category == Category::Tech));
    }

    #[test]
    fn refresh_keeps_page() {
        let mut c = ready(6, 2);
        c.dispatch(Action::LoadMore);
        c.begin_load();
        let up = c.finish_load(Ok(snapshot(8)));
        assert_eq!(up.state.page, 2);
        assert_eq!(up.page.total, 8);
    }

    #[test]
    fn restore_replaces_state_and_recomputes() {
        let mut c = ready(6, 2);
        c.dispatch(Action::LoadMore);
        let restored = FilterState {
            category: CategoryFilter::parse("policy"),
            sort: SortKey::Importance,
            page: 0,
            ..FilterState::with_page_size(2)
        };
        let up = c.restore(restored).unwrap();
        assert_eq!(up.state.page, 1);
        assert_eq!(up.page.total, 3);
        assert_eq!(up.page.items[0].title, "item 5");
    }

    #[test]
    fn actions_before_first_load_apply_on_load() {
        let mut c = FeedController::new(Pipeline::default(), FilterState::default());
        assert!(c.dispatch(Action::SetQuery("item 1".into())).is_none());
        c.begin_load();
        let up = c.finish_load(Ok(snapshot(3)));
        assert_eq!(up.page.total, 1);
    }
}
