//! AI News Feed: binary entrypoint
//! Boots the Axum HTTP server: loads config, performs the initial load,
//! starts the refresh/update-check loops and serves the query API.

use ai_news_feed::api::{create_router, AppState};
use ai_news_feed::config::FeedConfig;
use ai_news_feed::metrics::Metrics;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs. `FEED_LOG` wins over `RUST_LOG`.
fn init_tracing() {
    let filter = std::env::var("FEED_LOG")
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("ai_news_feed=info,warn"));

    // The platform runtime may already have installed a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = FeedConfig::load_default()?;
    tracing::info!(
        target: "main",
        page_size = config.page_size,
        sources = config.sources.len(),
        mock_fallback = config.mock_fallback,
        "feed config loaded"
    );

    let metrics = match Metrics::install() {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(target: "main", error = %e, "metrics disabled");
            None
        }
    };

    let state = AppState::from_config(config);
    // A failed first load is not fatal: the API answers 503 until /refresh
    // or the next scheduled refresh succeeds.
    let _ = state.bootstrap().await;
    let state = state.with_auto_update();

    let router = create_router(state, metrics.as_ref());
    Ok(router.into())
}
