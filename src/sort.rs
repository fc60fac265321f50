//! # Sorting
//! Descending orderings by publication time or importance. All sorts are stable
//! and put items missing the sort value after every item that has one.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::item::NewsItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum SortKey {
    #[default]
    Time,
    Importance,
    /// Alias of `Importance` until a real relevance score exists.
    Relevance,
}

impl SortKey {
    /// Unrecognized keys fall back to `Time`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "importance" => SortKey::Importance,
            "relevance" => SortKey::Relevance,
            _ => SortKey::Time,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Time => "time",
            SortKey::Importance => "importance",
            SortKey::Relevance => "relevance",
        }
    }

    /// Ordering of `a` relative to `b` under this key (descending, missing last).
    pub fn compare(self, a: &NewsItem, b: &NewsItem) -> Ordering {
        match self {
            SortKey::Time => desc_missing_last(a.published_at, b.published_at, |x, y| x.cmp(y)),
            SortKey::Importance | SortKey::Relevance => {
                desc_missing_last(a.importance, b.importance, |x, y| x.total_cmp(y))
            }
        }
    }
}

impl From<String> for SortKey {
    fn from(s: String) -> Self {
        SortKey::parse(&s)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn desc_missing_last<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(&y, &x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sort step of the pipeline. Equal keys keep their input order.
pub fn sort_items(items: &mut [&NewsItem], key: SortKey) {
    items.sort_by(|a, b| key.compare(a, b));
}
