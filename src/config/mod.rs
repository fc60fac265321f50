// src/config/mod.rs
pub mod feed;

pub use feed::{CollectorConfig, FeedConfig, FeedSpec, Priority, SourceSpec};
