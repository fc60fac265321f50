use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::config::FeedConfig;
use crate::error::LoadError;
use crate::events::EventBus;
use crate::filter::CategoryFilter;
use crate::ingest::scheduler::{refresh_store, spawn_feed_tasks, FeedSchedulerCfg, ScheduledTasks};
use crate::ingest::FallbackLoader;
use crate::item::{ImportanceTier, NewsItem};
use crate::metrics::Metrics;
use crate::paginate::PageResult;
use crate::pipeline::{signals_for, EmptyState, FilterState, Pipeline, Signal};
use crate::search::highlight;
use crate::sort::SortKey;
use crate::stats::{category_counts, feed_stats, hot_list, CategoryCount, FeedStats, HotItem};
use crate::store::ItemStore;

/// Page sizes above this are clamped.
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub store: ItemStore,
    pub loader: Arc<FallbackLoader>,
    pub pipeline: Arc<Pipeline>,
    pub config: Arc<FeedConfig>,
    pub events: EventBus,
    pub auto_update: bool,
    /// Background loops; they stop when the last state clone is dropped.
    tasks: Option<Arc<ScheduledTasks>>,
}

impl AppState {
    pub fn new(config: FeedConfig, loader: FallbackLoader) -> Self {
        let pipeline = Pipeline::new(config.fields());
        Self {
            store: ItemStore::new(),
            loader: Arc::new(loader),
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
            events: EventBus::default(),
            auto_update: false,
            tasks: None,
        }
    }

    pub fn from_config(config: FeedConfig) -> Self {
        let loader = FallbackLoader::from_config(&config);
        Self::new(config, loader)
    }

    /// Start auto-refresh and the update check. Must run inside a tokio runtime.
    pub fn with_auto_update(mut self) -> Self {
        let cfg = FeedSchedulerCfg {
            refresh_interval_secs: self.config.refresh_interval_secs,
            update_check_secs: self.config.update_check_secs,
        };
        let tasks = spawn_feed_tasks(
            cfg,
            self.loader.clone(),
            self.store.clone(),
            self.events.clone(),
        );
        self.tasks = Some(Arc::new(tasks));
        self.auto_update = true;
        self
    }

    /// Initial load. A failure leaves the store empty; `/refresh` can retry.
    pub async fn bootstrap(&self) -> Result<(), LoadError> {
        match refresh_store(&self.loader, &self.store, &self.events).await {
            Ok(snap) => {
                tracing::info!(
                    target: "api",
                    items = snap.items.len(),
                    origin = snap.origin.label(),
                    "initial load"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(target: "api", error = %e, "initial load failed");
                Err(e)
            }
        }
    }
}

pub fn create_router(state: AppState, metrics: Option<&Metrics>) -> Router {
    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/news", get(news))
        .route("/news/hot", get(news_hot))
        .route("/stats", get(stats))
        .route("/categories", get(categories))
        .route("/status", get(status))
        .route("/refresh", post(refresh))
        .layer(CorsLayer::very_permissive())
        .with_state(state);
    match metrics {
        Some(m) => app.merge(m.router()),
        None => app,
    }
}

/// Router over `state` without the metrics endpoint.
pub fn router(state: AppState) -> Router {
    create_router(state, None)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    retry_hint: &'static str,
    signals: Vec<Signal>,
}

fn unavailable(err: &LoadError) -> Response {
    let body = ErrorBody {
        error: err.to_string(),
        retry_hint: err.retry_hint(),
        signals: vec![Signal::LoadFailed {
            message: err.to_string(),
        }],
    };
    (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
}

fn not_loaded() -> Response {
    unavailable(&LoadError::NoSources)
}

#[derive(Debug, Default, Deserialize)]
struct NewsQuery {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    sort: Option<String>,
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    page_size: Option<usize>,
}

impl NewsQuery {
    fn into_state(self, cfg: &FeedConfig) -> FilterState {
        FilterState {
            category: CategoryFilter::parse(self.category.as_deref().unwrap_or_default()),
            query: self.q.unwrap_or_default(),
            sort: self
                .sort
                .as_deref()
                .map(SortKey::parse)
                .unwrap_or(cfg.default_sort),
            page: self.page.unwrap_or(1),
            page_size: self
                .page_size
                .unwrap_or(cfg.page_size)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// Item as served: the record plus display-ready extras.
#[derive(Debug, Serialize)]
struct NewsView {
    #[serde(flatten)]
    item: NewsItem,
    tier: ImportanceTier,
    relative_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title_highlighted: Option<String>,
}

#[derive(Debug, Serialize)]
struct NewsResponse {
    state: FilterState,
    #[serde(flatten)]
    page: PageResult<NewsView>,
    signals: Vec<Signal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    empty_state: Option<EmptyState>,
}

async fn news(State(state): State<AppState>, Query(q): Query<NewsQuery>) -> Response {
    let Some(snap) = state.store.current() else {
        return not_loaded();
    };
    let filter = q.into_state(&state.config);
    let page = state.pipeline.run(&snap.items, &filter);
    let filters_active = filter.filters_active();
    let signals = signals_for(&page, filters_active);
    let empty_state = signals
        .iter()
        .any(|s| matches!(s, Signal::NoResults { .. }))
        .then(|| EmptyState::for_filters(filters_active));

    let now = Utc::now();
    let needle = filter.query.trim().to_string();
    let page = page.map(|item| NewsView {
        tier: item.tier(),
        relative_time: item.relative_time(now),
        title_highlighted: (!needle.is_empty())
            .then(|| highlight(&item.title, &needle, "<mark>", "</mark>")),
        item,
    });

    Json(NewsResponse {
        state: filter,
        page,
        signals,
        empty_state,
    })
    .into_response()
}

async fn news_hot(State(state): State<AppState>) -> Response {
    match state.store.current() {
        Some(snap) => Json::<Vec<HotItem>>(hot_list(&snap.items)).into_response(),
        None => not_loaded(),
    }
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    #[serde(flatten)]
    stats: FeedStats,
    pending_new: usize,
}

async fn stats(State(state): State<AppState>) -> Response {
    match state.store.current() {
        Some(snap) => Json(StatsResponse {
            stats: feed_stats(&snap),
            pending_new: state.store.pending_new(),
        })
        .into_response(),
        None => not_loaded(),
    }
}

async fn categories(State(state): State<AppState>) -> Response {
    match state.store.current() {
        Some(snap) => Json::<Vec<CategoryCount>>(category_counts(&snap.items)).into_response(),
        None => not_loaded(),
    }
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    loaded: bool,
    last_update: Option<DateTime<Utc>>,
    real_data: bool,
    origin: Option<String>,
    auto_update: bool,
    pending_new: usize,
    sources: Vec<String>,
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let snap = state.store.current();
    Json(StatusResponse {
        loaded: snap.is_some(),
        last_update: snap.as_ref().map(|s| s.loaded_at),
        real_data: snap.as_ref().is_some_and(|s| s.origin.is_real()),
        origin: snap.as_ref().map(|s| s.origin.label().to_string()),
        auto_update: state.auto_update,
        pending_new: state.store.pending_new(),
        sources: state
            .loader
            .source_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

#[derive(Debug, Serialize)]
struct RefreshResponse {
    items: usize,
    origin: String,
    real_data: bool,
    loaded_at: DateTime<Utc>,
}

async fn refresh(State(state): State<AppState>) -> Response {
    match refresh_store(&state.loader, &state.store, &state.events).await {
        Ok(snap) => Json(RefreshResponse {
            items: snap.items.len(),
            origin: snap.origin.label().to_string(),
            real_data: snap.origin.is_real(),
            loaded_at: snap.loaded_at,
        })
        .into_response(),
        Err(e) => {
            tracing::warn!(target: "api", error = %e, "manual refresh failed");
            unavailable(&e)
        }
    }
}
