//! One-shot collector: fetch the configured RSS feeds, score and dedup the
//! entries, and write the snapshot the service loads.

use ai_news_feed::collect::{summarize, write_snapshot, Collector};
use ai_news_feed::config::FeedConfig;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ai_news_feed=info,warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = FeedConfig::load_default()?;
    let cfg = &config.collector;
    tracing::info!(feeds = cfg.feeds.len(), output = %cfg.output.display(), "collecting");

    let items = Collector::from_config(cfg).collect_all().await;
    if items.is_empty() {
        tracing::warn!("no items collected, leaving the existing snapshot in place");
        return Ok(());
    }
    write_snapshot(&cfg.output, &items)?;

    let summary = summarize(&items);
    tracing::info!(
        total = summary.total,
        high_importance = summary.high_importance,
        "snapshot written"
    );
    for (category, n) in &summary.per_category {
        tracing::info!(%category, count = n, "category");
    }
    for (rank, it) in items.iter().take(5).enumerate() {
        tracing::info!(
            rank = rank + 1,
            importance = it.importance.unwrap_or_default(),
            title = it.title.as_deref().unwrap_or_default(),
            "top item"
        );
    }
    Ok(())
}
