//! # News Items
//! The normalized news record the feed pipeline works over, and the tagged
//! field accessors search and sort use instead of looking fields up by name.
//!
//! Items are produced by `ingest::normalize_item` from lenient wire records and
//! are read-only afterwards.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Importance at or above this is "high impact".
pub const HIGH_IMPACT_MIN: f64 = 8.5;
/// Importance at or above this (and below high) is "medium impact".
pub const MEDIUM_IMPACT_MIN: f64 = 7.0;
/// Importance at or above this marks an item as trending when the record doesn't say.
pub const TRENDING_MIN: f64 = 8.0;
/// Items published within this many hours count as new.
pub const RECENT_HOURS: i64 = 24;

/// Item identifier: the mock set uses integers, collected snapshots use strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Num(u64),
    Text(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Num(n) => write!(f, "{n}"),
            ItemId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for ItemId {
    fn from(n: u64) -> Self {
        ItemId::Num(n)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId::Text(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId::Text(s)
    }
}

/// Closed set of news categories. Anything unrecognized lands in `Other`,
/// which no category filter ever selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Category {
    Tech,
    Industry,
    Application,
    Policy,
    Other,
}

impl Category {
    /// The real categories, in display order.
    pub const ALL: [Category; 4] = [
        Category::Tech,
        Category::Industry,
        Category::Application,
        Category::Policy,
    ];

    /// Case-insensitive lookup of a known category key.
    pub fn parse(raw: &str) -> Option<Category> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tech" => Some(Category::Tech),
            "industry" => Some(Category::Industry),
            "application" => Some(Category::Application),
            "policy" => Some(Category::Policy),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Tech => "tech",
            Category::Industry => "industry",
            Category::Application => "application",
            Category::Policy => "policy",
            Category::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Tech => "Tech breakthroughs",
            Category::Industry => "Industry news",
            Category::Application => "Applications",
            Category::Policy => "Policy & regulation",
            Category::Other => "Other",
        }
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Category::parse(&s).unwrap_or(Category::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl From<String> for Sentiment {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportanceTier {
    High,
    Medium,
    Low,
}

impl ImportanceTier {
    /// Missing scores classify as low.
    pub fn of(score: Option<f64>) -> Self {
        match score {
            Some(s) if s >= HIGH_IMPACT_MIN => ImportanceTier::High,
            Some(s) if s >= MEDIUM_IMPACT_MIN => ImportanceTier::Medium,
            _ => ImportanceTier::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: ItemId,
    pub title: String,
    pub summary: String,
    pub category: Category,
    pub source: String,
    pub url: Option<String>,
    pub importance: Option<f64>,
    pub keywords: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub sentiment: Sentiment,
    pub is_new: bool,
    pub is_trending: bool,
}

impl NewsItem {
    /// Bare item with empty text fields; chain the setters to fill it in.
    pub fn new(id: impl Into<ItemId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            summary: String::new(),
            category: Category::Other,
            source: String::new(),
            url: None,
            importance: None,
            keywords: Vec::new(),
            published_at: None,
            sentiment: Sentiment::Neutral,
            is_new: false,
            is_trending: false,
        }
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn importance(mut self, score: f64) -> Self {
        self.importance = Some(score);
        self
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn published_at(mut self, ts: DateTime<Utc>) -> Self {
        self.published_at = Some(ts);
        self
    }

    pub fn tier(&self) -> ImportanceTier {
        ImportanceTier::of(self.importance)
    }

    /// Published within the last 24h relative to `now`. Undated items are never recent.
    pub fn is_recent(&self, now: DateTime<Utc>) -> bool {
        self.published_at
            .is_some_and(|ts| now.signed_duration_since(ts) < Duration::hours(RECENT_HOURS))
    }

    /// Human-readable age ("5 minutes ago", "3 hours ago", "2 days ago", or a date).
    pub fn relative_time(&self, now: DateTime<Utc>) -> String {
        let Some(ts) = self.published_at else {
            return "just now".to_string();
        };
        let age = now.signed_duration_since(ts);
        let mins = age.num_minutes().max(0);
        if mins < 60 {
            format!("{mins} minutes ago")
        } else if age.num_hours() < 24 {
            format!("{} hours ago", age.num_hours())
        } else if age.num_days() < 7 {
            format!("{} days ago", age.num_days())
        } else {
            ts.format("%Y-%m-%d").to_string()
        }
    }
}

/// Tagged accessor for the fields search and sort can be configured over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Summary,
    Keywords,
    Source,
    Category,
    Importance,
    PublishedAt,
}

/// Borrowed view of one field of one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    List(&'a [String]),
    Number(f64),
    Time(DateTime<Utc>),
    Missing,
}

impl Field {
    pub fn get(self, item: &NewsItem) -> FieldValue<'_> {
        match self {
            Field::Title => FieldValue::Text(&item.title),
            Field::Summary => FieldValue::Text(&item.summary),
            Field::Keywords => FieldValue::List(&item.keywords),
            Field::Source => FieldValue::Text(&item.source),
            Field::Category => FieldValue::Text(item.category.as_str()),
            Field::Importance => item.importance.map_or(FieldValue::Missing, FieldValue::Number),
            Field::PublishedAt => item.published_at.map_or(FieldValue::Missing, FieldValue::Time),
        }
    }

    /// Accepts both the snake_case names and the camelCase names the dashboard data uses.
    pub fn parse(raw: &str) -> Option<Field> {
        match raw.trim() {
            "title" => Some(Field::Title),
            "summary" => Some(Field::Summary),
            "keywords" => Some(Field::Keywords),
            "source" => Some(Field::Source),
            "category" => Some(Field::Category),
            "importance" | "importance_score" => Some(Field::Importance),
            "published_at" | "published_date" | "publishTime" => Some(Field::PublishedAt),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn unknown_category_maps_to_other() {
        assert_eq!(Category::from("Tech".to_string()), Category::Tech);
        assert_eq!(Category::from("research".to_string()), Category::Other);
        assert_eq!(Category::parse("all"), None);
    }

    #[test]
    fn tiers_follow_thresholds() {
        assert_eq!(ImportanceTier::of(Some(8.5)), ImportanceTier::High);
        assert_eq!(ImportanceTier::of(Some(7.0)), ImportanceTier::Medium);
        assert_eq!(ImportanceTier::of(Some(6.99)), ImportanceTier::Low);
        assert_eq!(ImportanceTier::of(None), ImportanceTier::Low);
    }

    #[test]
    fn recency_and_relative_time() {
        let now = Utc.with_ymd_and_hms(2025, 12, 18, 12, 0, 0).unwrap();
        let item = NewsItem::new(1u64, "x").published_at(now - Duration::hours(3));
        assert!(item.is_recent(now));
        assert_eq!(item.relative_time(now), "3 hours ago");

        let old = NewsItem::new(2u64, "y").published_at(now - Duration::days(10));
        assert!(!old.is_recent(now));
        assert_eq!(old.relative_time(now), "2025-12-08");
        assert_eq!(NewsItem::new(3u64, "z").relative_time(now), "just now");
    }

    #[test]
    fn field_accessors_report_missing_values() {
        let item = NewsItem::new("a", "Title").keywords(["k1", "k2"]);
        assert_eq!(Field::Title.get(&item), FieldValue::Text("Title"));
        assert!(matches!(Field::Keywords.get(&item), FieldValue::List(k) if k.len() == 2));
        assert_eq!(Field::Importance.get(&item), FieldValue::Missing);
        assert_eq!(Field::parse("publishTime"), Some(Field::PublishedAt));
    }
}
