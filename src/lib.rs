// src/lib.rs
// Public library surface for the service binary, the collector and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;

// Data model and the query pipeline (filter -> search -> sort -> paginate)
pub mod filter;
pub mod item;
pub mod paginate;
pub mod pipeline;
pub mod search;
pub mod sort;

// Session state, loading and background jobs
pub mod controller;
pub mod events;
pub mod ingest;
pub mod live;
pub mod session;
pub mod stats;
pub mod store;
pub mod timing;

// Offline RSS collection
pub mod collect;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, router, AppState};
pub use crate::controller::{Action, FeedController, Phase, Update};
pub use crate::error::LoadError;
pub use crate::ingest::FallbackLoader;
pub use crate::item::{Category, ItemId, NewsItem};
pub use crate::pipeline::{FilterState, Pipeline, Signal};
pub use crate::store::{ItemStore, Snapshot};
