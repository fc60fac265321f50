//! # Feed Statistics
//! Headline numbers, the "hot" list and per-category counts derived from a
//! snapshot.

use serde::Serialize;
use std::collections::HashSet;

use crate::item::{Category, ItemId, NewsItem, HIGH_IMPACT_MIN};
use crate::store::Snapshot;

pub const HOT_LIST_LEN: usize = 5;
pub const HOT_TITLE_MAX: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedStats {
    pub total: usize,
    pub high_impact: usize,
    pub sources: usize,
    pub real_data: bool,
    pub origin: String,
    pub loaded_at: String,
}

pub fn feed_stats(snap: &Snapshot) -> FeedStats {
    let sources: HashSet<&str> = snap.items.iter().map(|it| it.source.as_str()).collect();
    FeedStats {
        total: snap.items.len(),
        high_impact: snap
            .items
            .iter()
            .filter(|it| it.importance.is_some_and(|v| v >= HIGH_IMPACT_MIN))
            .count(),
        sources: sources.len(),
        real_data: snap.origin.is_real(),
        origin: snap.origin.label().to_string(),
        loaded_at: snap.loaded_at.to_rfc3339(),
    }
}

/// Cut to `max` chars, appending "..." when anything was dropped.
pub fn truncate_text(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

pub fn trend_value(importance: Option<f64>) -> &'static str {
    match importance {
        Some(v) if v >= 9.0 => "+25%",
        Some(v) if v >= 8.0 => "+15%",
        Some(v) if v >= 7.0 => "+10%",
        _ => "+5%",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotItem {
    pub id: ItemId,
    pub title: String,
    pub rank: usize,
    pub trend: &'static str,
    pub trend_value: &'static str,
}

/// Top items by importance (stable for ties), titles shortened for display.
pub fn hot_list(items: &[NewsItem]) -> Vec<HotItem> {
    let mut refs: Vec<&NewsItem> = items.iter().collect();
    crate::sort::sort_items(&mut refs, crate::sort::SortKey::Importance);
    refs.into_iter()
        .take(HOT_LIST_LEN)
        .enumerate()
        .map(|(i, it)| HotItem {
            id: it.id.clone(),
            title: truncate_text(&it.title, HOT_TITLE_MAX),
            rank: i + 1,
            trend: "up",
            trend_value: trend_value(it.importance),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub key: &'static str,
    pub label: &'static str,
    pub count: usize,
}

/// Count per selectable category, led by the "all" bucket.
pub fn category_counts(items: &[NewsItem]) -> Vec<CategoryCount> {
    let mut out = Vec::with_capacity(Category::ALL.len() + 1);
    out.push(CategoryCount {
        key: "all",
        label: "All news",
        count: items.len(),
    });
    for cat in Category::ALL {
        out.push(CategoryCount {
            key: cat.as_str(),
            label: cat.label(),
            count: items.iter().filter(|it| it.category == cat).count(),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Origin;
    use chrono::Utc;

    fn items() -> Vec<NewsItem> {
        vec![
            NewsItem::new(1u64, "A fairly long headline that needs trimming")
                .category(Category::Tech)
                .source("A")
                .importance(9.1),
            NewsItem::new(2u64, "Short").category(Category::Policy).source("B").importance(8.5),
            NewsItem::new(3u64, "Other").category(Category::Other).source("A").importance(6.0),
            NewsItem::new(4u64, "Tied").category(Category::Tech).source("C").importance(8.5),
        ]
    }

    #[test]
    fn stats_count_high_impact_and_sources() {
        let snap = Snapshot::new(items(), Origin::Mock, Utc::now());
        let s = feed_stats(&snap);
        assert_eq!(s.total, 4);
        assert_eq!(s.high_impact, 3);
        assert_eq!(s.sources, 3);
        assert!(!s.real_data);
        assert_eq!(s.origin, "mock");
    }

    #[test]
    fn hot_list_ranks_and_truncates() {
        let hot = hot_list(&items());
        assert_eq!(hot.len(), 4);
        assert_eq!(hot[0].rank, 1);
        assert_eq!(hot[0].title, "A fairly long headline that ne...");
        assert_eq!(hot[0].trend_value, "+25%");
        // ties keep input order
        assert_eq!(hot[1].id, ItemId::Num(2));
        assert_eq!(hot[2].id, ItemId::Num(4));
        assert_eq!(hot[3].trend_value, "+5%");
    }

    #[test]
    fn category_counts_skip_other() {
        let c = category_counts(&items());
        assert_eq!(c[0].count, 4);
        let tech = c.iter().find(|c| c.key == "tech").unwrap();
        assert_eq!(tech.count, 2);
        assert_eq!(c.iter().map(|c| c.count).skip(1).sum::<usize>(), 3);
    }
}
