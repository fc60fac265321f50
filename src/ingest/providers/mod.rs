// src/ingest/providers/mod.rs
pub mod http_json;
pub mod json_file;
pub mod mock;
pub mod rss;

pub use http_json::HttpJsonSource;
pub use json_file::JsonFileSource;
pub use mock::MockSource;
pub use rss::RssSource;

use std::time::Duration;

/// Shared HTTP client for remote sources. Falls back to the default client if
/// the builder rejects the settings.
pub fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .user_agent(concat!("ai-news-feed/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(target: "ingest", error = %e, "http client builder failed, using defaults");
            reqwest::Client::new()
        })
}
