// src/ingest/mod.rs
pub mod providers;
pub mod scheduler;
pub mod types;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::config::{FeedConfig, SourceSpec};
use crate::error::LoadError;
use crate::ingest::providers::{HttpJsonSource, JsonFileSource, MockSource, RssSource};
use crate::ingest::types::{DataSource, RawNewsItem};
use crate::item::{Category, ItemId, NewsItem, Sentiment, TRENDING_MIN};
use crate::store::{Origin, Snapshot};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_load_total", "Load attempts through the fallback chain.");
        describe_counter!(
            "feed_load_failures_total",
            "Loads where no item sequence could be produced."
        );
        describe_counter!(
            "feed_source_errors_total",
            "Individual data source fetch/parse errors."
        );
        describe_counter!(
            "feed_malformed_items_total",
            "Records skipped because they could not be read."
        );
        describe_gauge!("feed_items_loaded", "Items in the current snapshot.");
        describe_gauge!("feed_last_load_ts", "Unix ts of the last successful load.");
        describe_histogram!("feed_fetch_ms", "Remote fetch latency in milliseconds.");
        describe_counter!("feed_refresh_runs_total", "Scheduled auto-refresh runs.");
        describe_gauge!(
            "feed_pending_new_items",
            "Items seen by the last update check but not yet shown."
        );
    });
}

fn re_tags() -> &'static regex::Regex {
    static RE: OnceCell<regex::Regex> = OnceCell::new();
    RE.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").expect("static regex"))
}

fn re_ws() -> &'static regex::Regex {
    static RE: OnceCell<regex::Regex> = OnceCell::new();
    RE.get_or_init(|| regex::Regex::new(r"\s+").expect("static regex"))
}

/// Normalize text: decode entities, strip tags, collapse whitespace, trim.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    let out = re_tags().replace_all(&out, "");

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    let out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    let out = re_ws().replace_all(&out, " ").trim().to_string();

    // 5) Length cap: 1500 chars
    if out.chars().count() > 1500 {
        return out.chars().take(1500).collect();
    }
    out
}

/// Normalize and cut a summary to `max` chars, preferring a sentence end and
/// then a word boundary in the last 40% of the window.
pub fn clean_summary(s: &str, max: usize) -> String {
    let text = normalize_text(s);
    if text.chars().count() <= max {
        return text;
    }
    let cut: String = text.chars().take(max).collect();
    let floor = max * 6 / 10;
    let char_pos = |byte: usize| cut[..byte].chars().count();

    if let Some(p) = cut.rfind('.').filter(|&p| char_pos(p) > floor) {
        return cut[..=p].to_string();
    }
    if let Some(p) = cut.rfind(' ').filter(|&p| char_pos(p) > floor) {
        return format!("{}...", &cut[..p]);
    }
    format!("{cut}...")
}

/// Parse RFC 3339, RFC 2822, or a naive ISO date/datetime (taken as UTC).
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
}

fn has_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|w| w.eq_ignore_ascii_case(word))
}

/// Category for records that don't carry one, from title and keywords.
/// Checked in order policy, industry, application; anything else is tech.
pub fn infer_category(title: &str, keywords: &[String]) -> Category {
    let mut text = title.to_lowercase();
    for k in keywords {
        text.push(' ');
        text.push_str(&k.trim().to_lowercase());
    }
    if ["regulation", "policy", "safety"].iter().any(|w| text.contains(w)) || has_word(&text, "law") {
        return Category::Policy;
    }
    if ["funding", "valuation", "investment"].iter().any(|w| text.contains(w)) {
        return Category::Industry;
    }
    if ["chatgpt", "usage"].iter().any(|w| text.contains(w)) {
        return Category::Application;
    }
    Category::Tech
}

/// `"<source>_<first 16 hex of sha256(title + url)>"`.
pub fn derive_id(source: &str, title: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(url.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(source.len() + 17);
    out.push_str(source);
    out.push('_');
    for b in digest.iter().take(8) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn item_id(raw: &RawNewsItem, source: &str, title: &str) -> ItemId {
    match &raw.id {
        Some(serde_json::Value::Number(n)) if n.as_u64().is_some() => {
            ItemId::Num(n.as_u64().unwrap_or_default())
        }
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => ItemId::Text(s.trim().to_string()),
        _ => ItemId::Text(derive_id(source, title, raw.url.as_deref().unwrap_or_default())),
    }
}

/// Turn a lenient record into a `NewsItem`. Missing fields get neutral values;
/// nothing here fails.
pub fn normalize_item(raw: RawNewsItem, now: DateTime<Utc>) -> NewsItem {
    let title = normalize_text(raw.title.as_deref().unwrap_or_default());
    let source = raw
        .source
        .as_deref()
        .map(normalize_text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    let keywords: Vec<String> = raw
        .keywords
        .iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    let category = match raw.category.as_deref() {
        Some(c) if !c.trim().is_empty() => Category::from(c.to_string()),
        _ => infer_category(&title, &keywords),
    };
    let importance = raw.importance.filter(|v| v.is_finite());
    let published_at = raw.published.as_deref().and_then(parse_published);

    let mut item = NewsItem::new(item_id(&raw, &source, &title), title);
    item.summary = clean_summary(raw.summary.as_deref().unwrap_or_default(), 1500);
    item.category = category;
    item.source = source;
    item.url = raw.url.filter(|u| !u.trim().is_empty());
    item.importance = importance;
    item.keywords = keywords;
    item.published_at = published_at;
    item.sentiment = raw
        .sentiment
        .map(Sentiment::from)
        .unwrap_or_default();
    item.is_new = raw.is_new.unwrap_or_else(|| item.is_recent(now));
    item.is_trending = raw
        .is_trending
        .unwrap_or_else(|| importance.is_some_and(|v| v >= TRENDING_MIN));
    item
}

/// Normalize a batch, dropping repeated ids (first occurrence wins).
pub fn normalize_all(raws: Vec<RawNewsItem>, now: DateTime<Utc>) -> Vec<NewsItem> {
    let mut seen: HashSet<ItemId> = HashSet::with_capacity(raws.len());
    let mut out = Vec::with_capacity(raws.len());
    for raw in raws {
        let item = normalize_item(raw, now);
        if !seen.insert(item.id.clone()) {
            tracing::warn!(target: "ingest", id = %item.id, "duplicate id dropped");
            continue;
        }
        out.push(item);
    }
    out
}

/// Parse a JSON document: either an array of records or an object with a
/// `news` array. Records that aren't objects are skipped with a warning.
pub fn parse_document(s: &str) -> anyhow::Result<Vec<RawNewsItem>> {
    ensure_metrics_described();
    let doc: serde_json::Value = serde_json::from_str(s).map_err(anyhow::Error::from)?;
    let entries = match doc {
        serde_json::Value::Array(v) => v,
        serde_json::Value::Object(mut map) => match map.remove("news") {
            Some(serde_json::Value::Array(v)) => v,
            _ => anyhow::bail!("document object has no `news` array"),
        },
        _ => anyhow::bail!("document is neither an array nor an object"),
    };

    let mut out = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<RawNewsItem>(entry) {
            Ok(raw) => out.push(raw),
            Err(e) => {
                tracing::warn!(target: "ingest", idx, error = %e, "skipping malformed record");
                counter!("feed_malformed_items_total").increment(1);
            }
        }
    }
    Ok(out)
}

/// Tries each source in order; the first one producing a non-empty item set
/// wins. Falls back to the embedded mock set when enabled.
pub struct FallbackLoader {
    sources: Vec<Box<dyn DataSource>>,
    mock_fallback: bool,
}

impl FallbackLoader {
    pub fn new(sources: Vec<Box<dyn DataSource>>, mock_fallback: bool) -> Self {
        Self {
            sources,
            mock_fallback,
        }
    }

    pub fn from_config(cfg: &FeedConfig) -> Self {
        let client = providers::http_client(cfg.collector.timeout_secs);
        let sources = cfg
            .sources
            .iter()
            .map(|spec| -> Box<dyn DataSource> {
                match spec {
                    SourceSpec::File { path, .. } => {
                        Box::new(JsonFileSource::new(spec.name(), path.clone()))
                    }
                    SourceSpec::Http { url, .. } => {
                        Box::new(HttpJsonSource::new(spec.name(), url.clone(), client.clone()))
                    }
                    SourceSpec::Rss {
                        name,
                        url,
                        category,
                    } => Box::new(RssSource::new(
                        crate::config::FeedSpec {
                            name: name.clone(),
                            url: url.clone(),
                            category: category.clone().unwrap_or_else(|| "tech".into()),
                            priority: crate::config::Priority::Medium,
                            bonus: 0.0,
                        },
                        client.clone(),
                        cfg.collector.per_feed_limit,
                    )),
                }
            })
            .collect();
        Self::new(sources, cfg.mock_fallback)
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub async fn load(&self) -> Result<Snapshot, LoadError> {
        self.load_at(Utc::now()).await
    }

    pub async fn load_at(&self, now: DateTime<Utc>) -> Result<Snapshot, LoadError> {
        ensure_metrics_described();
        counter!("feed_load_total").increment(1);

        let mut last_err: Option<String> = None;
        for src in &self.sources {
            match src.fetch().await {
                Ok(raws) => {
                    let items = normalize_all(raws, now);
                    if items.is_empty() {
                        tracing::info!(target: "ingest", source = src.name(), "source returned no items");
                        last_err = Some(format!("{}: empty", src.name()));
                        continue;
                    }
                    tracing::info!(target: "ingest", source = src.name(), items = items.len(), "loaded");
                    return Ok(self.finish(Snapshot::new(items, Origin::Source(src.name().to_string()), now)));
                }
                Err(e) => {
                    tracing::warn!(target: "ingest", error = ?e, source = src.name(), "source error");
                    counter!("feed_source_errors_total").increment(1);
                    last_err = Some(format!("{}: {e:#}", src.name()));
                }
            }
        }

        if self.mock_fallback {
            match MockSource.fetch().await {
                Ok(raws) => {
                    let items = normalize_all(raws, now);
                    tracing::warn!(target: "ingest", items = items.len(), "no real data available, serving mock set");
                    return Ok(self.finish(Snapshot::new(items, Origin::Mock, now)));
                }
                Err(e) => {
                    tracing::error!(target: "ingest", error = ?e, "embedded mock set unreadable");
                    last_err = Some(format!("mock: {e:#}"));
                }
            }
        }

        counter!("feed_load_failures_total").increment(1);
        match last_err {
            None => Err(LoadError::NoSources),
            Some(last) => Err(LoadError::AllSourcesFailed {
                attempted: self.sources.len() + usize::from(self.mock_fallback),
                last,
            }),
        }
    }

    fn finish(&self, snap: Snapshot) -> Snapshot {
        gauge!("feed_items_loaded").set(snap.items.len() as f64);
        gauge!("feed_last_load_ts").set(snap.loaded_at.timestamp() as f64);
        snap
    }
}
