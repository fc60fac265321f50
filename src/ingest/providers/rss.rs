use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::collect::scoring;
use crate::config::FeedSpec;
use crate::ingest::types::{DataSource, RawNewsItem};
use crate::ingest::{clean_summary, derive_id, normalize_text, parse_published};

/// Summaries from feeds are cut to this many chars.
pub const SUMMARY_MAX: usize = 300;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    author: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}
#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(default)]
    link: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
}
#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}
#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
}

/// Entry fields common to RSS and Atom.
struct Entry {
    title: String,
    link: Option<String>,
    published: Option<String>,
    summary: String,
    author: Option<String>,
}

fn entries_from_str(s: &str) -> Result<Vec<Entry>> {
    let xml_clean = scrub_html_entities_for_xml(s);
    if xml_clean.contains("<rss") || xml_clean.contains("<channel") {
        let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;
        return Ok(rss
            .channel
            .item
            .into_iter()
            .map(|it| Entry {
                title: it.title.unwrap_or_default(),
                link: it.link,
                published: it.pub_date,
                summary: it.description.unwrap_or_default(),
                author: it.author,
            })
            .collect());
    }
    anyhow::ensure!(xml_clean.contains("<feed"), "unrecognized feed format");
    let atom: AtomFeed = from_str(&xml_clean).context("parsing atom xml")?;
    Ok(atom
        .entry
        .into_iter()
        .map(|e| Entry {
            title: e.title.map(|t| t.value).unwrap_or_default(),
            link: e.link.into_iter().find_map(|l| l.href),
            published: e.published.or(e.updated),
            summary: e.summary.or(e.content).map(|t| t.value).unwrap_or_default(),
            author: None,
        })
        .collect())
}

/// Parse a feed document into scored records for `feed`. Only the first
/// `limit` entries are considered, and only AI-related ones are kept.
pub fn parse_feed(xml: &str, feed: &FeedSpec, now: DateTime<Utc>, limit: usize) -> Result<Vec<RawNewsItem>> {
    let t0 = std::time::Instant::now();
    let entries = entries_from_str(xml).with_context(|| format!("feed {}", feed.name))?;

    let mut out = Vec::new();
    for e in entries.into_iter().take(limit) {
        let title = normalize_text(&e.title);
        let summary = clean_summary(&e.summary, SUMMARY_MAX);
        if title.is_empty() || !scoring::is_ai_related(&format!("{title} {summary}")) {
            continue;
        }
        let url = e.link.map(|l| l.trim().to_string()).unwrap_or_default();
        let text = format!("{title} {summary}");
        let keywords = scoring::extract_keywords(&text);
        let published_at = e.published.as_deref().and_then(parse_published);
        let base = scoring::importance(&title, &summary, &keywords, published_at, now);
        let importance = scoring::with_source_bonus(base, feed.bonus);

        out.push(RawNewsItem {
            id: Some(serde_json::Value::String(derive_id(&feed.name, &title, &url))),
            summary: Some(summary),
            url: (!url.is_empty()).then_some(url),
            source: Some(feed.name.clone()),
            author: e.author.filter(|a| !a.trim().is_empty()),
            category: Some(feed.category.clone()),
            importance: Some(importance),
            keywords,
            published: e.published,
            sentiment: Some(scoring::sentiment(&text).as_str().to_string()),
            is_new: None,
            is_trending: None,
            title: Some(title),
        });
    }

    histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("collect_items_total").increment(out.len() as u64);
    Ok(out)
}

/// An RSS or Atom feed, scored on the way in.
pub struct RssSource {
    feed: FeedSpec,
    client: reqwest::Client,
    limit: usize,
}

impl RssSource {
    pub fn new(feed: FeedSpec, client: reqwest::Client, limit: usize) -> Self {
        Self {
            feed,
            client,
            limit,
        }
    }
}

#[async_trait]
impl DataSource for RssSource {
    async fn fetch(&self) -> Result<Vec<RawNewsItem>> {
        let body = match self.client.get(&self.feed.url).send().await {
            Ok(resp) => resp
                .error_for_status()
                .with_context(|| format!("{} http status", self.feed.name))?
                .text()
                .await
                .with_context(|| format!("{} http .text()", self.feed.name))?,
            Err(e) => {
                tracing::warn!(error = ?e, provider = %self.feed.name, "provider http error");
                return Err(e).with_context(|| format!("{} http get()", self.feed.name));
            }
        };
        parse_feed(&body, &self.feed, Utc::now(), self.limit)
    }

    fn name(&self) -> &str {
        &self.feed.name
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Priority;

    fn feed() -> FeedSpec {
        FeedSpec {
            name: "Lab Blog".into(),
            url: "https://lab.test/rss".into(),
            category: "tech".into(),
            priority: Priority::High,
            bonus: 0.5,
        }
    }

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Lab</title>
<item><title>OpenAI launches GPT-5</title><link>https://lab.test/1</link>
<pubDate>Thu, 18 Dec 2025 10:00:00 +0000</pubDate>
<description>&lt;p&gt;A new AI model&nbsp;arrives.&lt;/p&gt;</description></item>
<item><title>Gardening tips for winter</title><link>https://lab.test/2</link>
<description>Mulch your beds.</description></item>
</channel></rss>"#;

    const ATOM: &str = r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom"><title>Lab</title>
<entry><title type="html">Deep learning breakthrough</title>
<link href="https://lab.test/a"/><updated>2025-12-18T08:00:00Z</updated>
<content type="html">Neural network results.</content></entry>
</feed>"#;

    #[test]
    fn rss_entries_are_filtered_and_scored() {
        let now = parse_published("2025-12-18T12:00:00Z").unwrap();
        let out = parse_feed(RSS, &feed(), now, 10).unwrap();
        assert_eq!(out.len(), 1);
        let it = &out[0];
        assert_eq!(it.title.as_deref(), Some("OpenAI launches GPT-5"));
        assert_eq!(it.summary.as_deref(), Some("A new AI model arrives."));
        assert_eq!(it.source.as_deref(), Some("Lab Blog"));
        assert!(it.importance.unwrap() > 8.0);
        assert!(it.keywords.iter().any(|k| k == "OpenAI"));
    }

    #[test]
    fn atom_entries_are_read() {
        let now = parse_published("2025-12-18T12:00:00Z").unwrap();
        let out = parse_feed(ATOM, &feed(), now, 10).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].url.as_deref(), Some("https://lab.test/a"));
        assert_eq!(out[0].published.as_deref(), Some("2025-12-18T08:00:00Z"));
    }

    #[test]
    fn limit_applies_before_filtering() {
        let now = Utc::now();
        assert!(parse_feed(RSS, &feed(), now, 0).unwrap().is_empty());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_feed("<html>nope", &feed(), Utc::now(), 10).is_err());
    }
}
