//! # Collector
//! One-shot RSS collection: fetch every configured feed grouped by priority,
//! score entries, drop duplicates, sort by importance and write the JSON
//! snapshot the loader reads.

pub mod dedup;
pub mod scoring;

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, gauge};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

use crate::config::{CollectorConfig, Priority};
use crate::ingest::providers::{http_client, RssSource};
use crate::ingest::types::{DataSource, RawNewsItem};
use crate::item::HIGH_IMPACT_MIN;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("collect_items_total", "Entries kept from feeds before dedup.");
        describe_counter!("collect_feed_errors_total", "Feed fetch/parse failures.");
    });
}

pub struct Collector {
    sources: Vec<(Priority, Arc<dyn DataSource>)>,
    spacing: Duration,
    group_pause: Duration,
}

impl Collector {
    pub fn new(
        sources: Vec<(Priority, Arc<dyn DataSource>)>,
        spacing: Duration,
        group_pause: Duration,
    ) -> Self {
        Self {
            sources,
            spacing,
            group_pause,
        }
    }

    pub fn from_config(cfg: &CollectorConfig) -> Self {
        let client = http_client(cfg.timeout_secs);
        let sources = cfg
            .feeds
            .iter()
            .map(|f| {
                let src: Arc<dyn DataSource> =
                    Arc::new(RssSource::new(f.clone(), client.clone(), cfg.per_feed_limit));
                (f.priority, src)
            })
            .collect();
        Self::new(
            sources,
            Duration::from_millis(cfg.request_spacing_ms),
            Duration::from_millis(cfg.group_pause_ms),
        )
    }

    /// Fetch all groups (high, then medium, then low), then dedup and sort.
    pub async fn collect_all(&self) -> Vec<RawNewsItem> {
        ensure_metrics_described();
        let mut all = Vec::new();
        let groups = [Priority::High, Priority::Medium, Priority::Low];
        let mut first = true;
        for prio in groups {
            let group: Vec<Arc<dyn DataSource>> = self
                .sources
                .iter()
                .filter(|(p, _)| *p == prio)
                .map(|(_, s)| Arc::clone(s))
                .collect();
            if group.is_empty() {
                continue;
            }
            if !first && !self.group_pause.is_zero() {
                tokio::time::sleep(self.group_pause).await;
            }
            first = false;
            tracing::info!(target: "collect", priority = ?prio, sources = group.len(), "collecting group");
            all.extend(self.collect_group(group).await);
        }

        let before = all.len();
        let mut unique = dedup::dedup(all);
        sort_by_importance(&mut unique);
        tracing::info!(target: "collect", fetched = before, unique = unique.len(), "collection finished");
        unique
    }

    async fn collect_group(&self, group: Vec<Arc<dyn DataSource>>) -> Vec<RawNewsItem> {
        let mut set = JoinSet::new();
        let count = group.len();
        for (idx, src) in group.into_iter().enumerate() {
            set.spawn(async move {
                let name = src.name().to_string();
                (idx, name, src.fetch().await)
            });
            if idx + 1 < count && !self.spacing.is_zero() {
                tokio::time::sleep(self.spacing).await;
            }
        }

        let mut results = Vec::with_capacity(count);
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(r) => results.push(r),
                Err(e) => tracing::error!(target: "collect", error = ?e, "feed task panicked"),
            }
        }
        // keep configuration order regardless of completion order
        results.sort_by_key(|(idx, _, _)| *idx);

        let mut out = Vec::new();
        for (_, name, res) in results {
            match res {
                Ok(items) => {
                    tracing::info!(target: "collect", feed = %name, items = items.len(), "feed fetched");
                    out.extend(items);
                }
                Err(e) => {
                    tracing::warn!(target: "collect", feed = %name, error = ?e, "feed failed");
                    counter!("collect_feed_errors_total").increment(1);
                }
            }
        }
        out
    }
}

/// Importance descending; stable; unscored entries last.
pub fn sort_by_importance(items: &mut [RawNewsItem]) {
    items.sort_by(|a, b| match (a.importance, b.importance) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// Write `items` as a pretty JSON array, via a temp file and rename.
pub fn write_snapshot(path: &Path, items: &[RawNewsItem]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let body = serde_json::to_string_pretty(items).context("serializing snapshot")?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;
    gauge!("collect_last_snapshot_items").set(items.len() as f64);
    Ok(())
}

/// Per-category counts and high-importance count, for the run summary.
#[derive(Debug, Default, PartialEq)]
pub struct CollectSummary {
    pub total: usize,
    pub per_category: BTreeMap<String, usize>,
    pub high_importance: usize,
}

pub fn summarize(items: &[RawNewsItem]) -> CollectSummary {
    let mut s = CollectSummary {
        total: items.len(),
        ..Default::default()
    };
    for it in items {
        let cat = it.category.clone().unwrap_or_else(|| "unknown".into());
        *s.per_category.entry(cat).or_default() += 1;
        if it.importance.is_some_and(|v| v >= HIGH_IMPACT_MIN) {
            s.high_importance += 1;
        }
    }
    s
}
