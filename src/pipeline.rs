//! # Feed Pipeline
//! Composes category filter → search → sort → paginate in that fixed order.
//! Every run is a pure function of (items, state); nothing here mutates the
//! store or the state.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::filter::{filter_by_category, CategoryFilter};
use crate::item::{Field, NewsItem};
use crate::paginate::{paginate, PageResult};
use crate::search::{search, SearchQuery, DEFAULT_SEARCH_FIELDS};
use crate::sort::{sort_items, SortKey};

pub const DEFAULT_PAGE_SIZE: usize = 10;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_pipeline_runs_total", "Full filter/search/sort passes.");
        describe_counter!(
            "feed_pipeline_empty_total",
            "Passes whose first page came back empty."
        );
        describe_histogram!("feed_pipeline_ms", "Filter/search/sort time in milliseconds.");
    });
}

/// Everything the query surface can change. Mutated only through
/// [`crate::controller::reduce`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub category: CategoryFilter,
    pub query: String,
    pub sort: SortKey,
    pub page: usize,
    pub page_size: usize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            category: CategoryFilter::All,
            query: String::new(),
            sort: SortKey::Time,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl FilterState {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    /// A category other than "all" or a non-blank query is set.
    pub fn filters_active(&self) -> bool {
        self.category.is_active() || !self.query.trim().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    fields: Vec<Field>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_FIELDS.to_vec())
    }
}

impl Pipeline {
    /// An empty field list means the default search fields.
    pub fn new(fields: Vec<Field>) -> Self {
        let fields = if fields.is_empty() {
            DEFAULT_SEARCH_FIELDS.to_vec()
        } else {
            fields
        };
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Filtered, searched and sorted view of `items`, before pagination.
    pub fn ordered<'a>(&self, items: &'a [NewsItem], state: &FilterState) -> Vec<&'a NewsItem> {
        ensure_metrics_described();
        let started = Instant::now();

        let narrowed = filter_by_category(items, &state.category);
        let mut hits = search(narrowed, &SearchQuery::new(&state.query), &self.fields);
        sort_items(&mut hits, state.sort);

        counter!("feed_pipeline_runs_total").increment(1);
        histogram!("feed_pipeline_ms").record(started.elapsed().as_secs_f64() * 1000.0);
        tracing::debug!(
            target: "pipeline",
            category = %state.category,
            query = %state.query,
            sort = %state.sort,
            input = items.len(),
            matched = hits.len(),
            "pipeline pass"
        );
        hits
    }

    /// Full pass: the requested page of the ordered view.
    pub fn run(&self, items: &[NewsItem], state: &FilterState) -> PageResult {
        let ordered = self.ordered(items, state);
        let page = paginate(&ordered, state.page, state.page_size).map(NewsItem::clone);
        if page.is_empty() && state.page == 1 {
            counter!("feed_pipeline_empty_total").increment(1);
        }
        page
    }
}

/// Conditions the rendering side reacts to besides the page itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signal {
    /// Page 1 came back empty.
    NoResults { filters_active: bool },
    /// The last page has been reached.
    NoMorePages,
    /// Loading failed; a retry is possible.
    LoadFailed { message: String },
}

/// Title and hint text shown for an empty first page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmptyState {
    pub title: &'static str,
    pub hint: &'static str,
}

impl EmptyState {
    pub fn for_filters(filters_active: bool) -> Self {
        if filters_active {
            Self {
                title: "No matching news",
                hint: "Try adjusting the filters or search keywords",
            }
        } else {
            Self {
                title: "No news yet",
                hint: "Please try again later",
            }
        }
    }
}

/// Signals for a freshly computed page. An empty result gets `NoResults` only;
/// `NoMorePages` is reserved for non-empty results whose end was reached.
pub fn signals_for<T>(page: &PageResult<T>, filters_active: bool) -> Vec<Signal> {
    let mut out = Vec::new();
    if page.total == 0 && page.page <= 1 {
        out.push(Signal::NoResults { filters_active });
    } else if !page.has_next {
        out.push(Signal::NoMorePages);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Category;

    fn sample() -> Vec<NewsItem> {
        vec![
            NewsItem::new(1u64, "GPT release").category(Category::Tech).importance(9.0),
            NewsItem::new(2u64, "Funding").category(Category::Industry).importance(7.0),
            NewsItem::new(3u64, "Chips").category(Category::Tech).importance(8.0),
        ]
    }

    #[test]
    fn default_state() {
        let s = FilterState::default();
        assert_eq!(s.page, 1);
        assert_eq!(s.page_size, 10);
        assert!(!s.filters_active());
        assert_eq!(FilterState::with_page_size(0).page_size, 1);
    }

    #[test]
    fn run_composes_all_steps() {
        let items = sample();
        let state = FilterState {
            category: CategoryFilter::parse("tech"),
            sort: SortKey::Importance,
            page_size: 1,
            ..FilterState::default()
        };
        let page = Pipeline::default().run(&items, &state);
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].title, "GPT release");
        assert!(page.has_next);
    }

    #[test]
    fn signals_distinguish_empty_from_exhausted() {
        let items = sample();
        let p = Pipeline::default();

        let empty = FilterState {
            query: "nothing".into(),
            ..FilterState::default()
        };
        let page = p.run(&items, &empty);
        assert_eq!(
            signals_for(&page, empty.filters_active()),
            vec![Signal::NoResults { filters_active: true }]
        );

        let all = p.run(&items, &FilterState::default());
        assert_eq!(signals_for(&all, false), vec![Signal::NoMorePages]);
    }

    #[test]
    fn empty_state_text_depends_on_filters() {
        assert_eq!(EmptyState::for_filters(true).title, "No matching news");
        assert_eq!(EmptyState::for_filters(false).hint, "Please try again later");
    }
}
