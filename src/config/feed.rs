// src/config/feed.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::item::Field;
use crate::search::DEFAULT_SEARCH_FIELDS;
use crate::sort::SortKey;

pub const ENV_CONFIG_PATH: &str = "FEED_CONFIG_PATH";
pub const ENV_PAGE_SIZE: &str = "FEED_PAGE_SIZE";
pub const ENV_MOCK_FALLBACK: &str = "FEED_MOCK_FALLBACK";

pub const DEFAULT_SESSION_PATH: &str = "state/feed_session.json";
pub const DEFAULT_SNAPSHOT_PATH: &str = "data/latest_news.json";

fn default_page_size() -> usize {
    10
}
fn default_true() -> bool {
    true
}
fn default_refresh_secs() -> u64 {
    1800
}
fn default_update_check_secs() -> u64 {
    30
}
fn default_debounce_ms() -> u64 {
    300
}
fn default_throttle_ms() -> u64 {
    100
}
fn default_search_fields() -> Vec<String> {
    vec!["title".into(), "summary".into(), "keywords".into()]
}
fn default_session_path() -> PathBuf {
    PathBuf::from(DEFAULT_SESSION_PATH)
}
fn default_sources() -> Vec<SourceSpec> {
    vec![
        SourceSpec::File {
            name: Some("latest".into()),
            path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
        },
        SourceSpec::File {
            name: Some("collected".into()),
            path: PathBuf::from("data/collected_news.json"),
        },
    ]
}

/// One entry of the loader's fallback chain, tried in list order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceSpec {
    /// A JSON snapshot on disk.
    File {
        #[serde(default)]
        name: Option<String>,
        path: PathBuf,
    },
    /// A JSON snapshot served over HTTP.
    Http {
        #[serde(default)]
        name: Option<String>,
        url: String,
    },
    /// An RSS feed read directly, without going through the collector.
    Rss {
        name: String,
        url: String,
        #[serde(default)]
        category: Option<String>,
    },
}

impl SourceSpec {
    pub fn name(&self) -> String {
        match self {
            SourceSpec::File { name, path } => name
                .clone()
                .unwrap_or_else(|| path.display().to_string()),
            SourceSpec::Http { name, url } => name.clone().unwrap_or_else(|| url.clone()),
            SourceSpec::Rss { name, .. } => name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// An RSS feed the collector pulls from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSpec {
    pub name: String,
    pub url: String,
    /// Category assigned to every item of this feed.
    #[serde(default = "default_feed_category")]
    pub category: String,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    /// Authority bonus added to each item's importance.
    #[serde(default)]
    pub bonus: f64,
}

fn default_feed_category() -> String {
    "tech".into()
}
fn default_priority() -> Priority {
    Priority::Medium
}

impl FeedSpec {
    fn new(name: &str, url: &str, priority: Priority, category: &str, bonus: f64) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            category: category.into(),
            priority,
            bonus,
        }
    }
}

fn default_feeds() -> Vec<FeedSpec> {
    use Priority::*;
    vec![
        FeedSpec::new("TechCrunch AI", "https://techcrunch.com/category/artificial-intelligence/feed/", High, "tech", 0.5),
        FeedSpec::new("The Verge AI", "https://www.theverge.com/rss/ai-artificial-intelligence/index.xml", High, "tech", 0.5),
        FeedSpec::new("Wired AI", "https://www.wired.com/feed/tag/ai/latest/rss", High, "tech", 0.5),
        FeedSpec::new("Ars Technica", "https://feeds.arstechnica.com/arstechnica/technology-lab", High, "tech", 0.4),
        FeedSpec::new("Google AI Blog", "https://blog.google/technology/ai/rss/", High, "tech", 0.5),
        FeedSpec::new("MIT Technology Review", "https://www.technologyreview.com/feed/", High, "tech", 0.5),
        FeedSpec::new("DeepMind Blog", "https://deepmind.google/blog/rss.xml", High, "tech", 0.5),
        FeedSpec::new("OpenAI News", "https://openai.com/news/rss.xml", High, "tech", 0.6),
        FeedSpec::new("Hugging Face Blog", "https://huggingface.co/blog/feed.xml", Medium, "tech", 0.4),
        FeedSpec::new("AI News", "https://artificialintelligence-news.com/feed/", Medium, "tech", 0.3),
        FeedSpec::new("VentureBeat AI", "https://venturebeat.com/category/ai/feed/", Medium, "tech", 0.3),
        FeedSpec::new("arXiv AI", "https://rss.arxiv.org/rss/cs.AI", Medium, "research", 0.3),
        FeedSpec::new("arXiv ML", "https://rss.arxiv.org/rss/cs.LG", Medium, "research", 0.3),
        FeedSpec::new("Reddit ML", "https://www.reddit.com/r/MachineLearning/.rss", Low, "tech", 0.1),
        FeedSpec::new("Lobsters AI", "https://lobste.rs/t/ai.rss", Low, "tech", 0.1),
    ]
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_SNAPSHOT_PATH)
}
fn default_per_feed_limit() -> usize {
    10
}
fn default_request_spacing_ms() -> u64 {
    1000
}
fn default_group_pause_ms() -> u64 {
    2000
}
fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorConfig {
    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedSpec>,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Entries taken from the top of each feed.
    #[serde(default = "default_per_feed_limit")]
    pub per_feed_limit: usize,
    /// Delay between starting requests within one priority group.
    #[serde(default = "default_request_spacing_ms")]
    pub request_spacing_ms: u64,
    /// Pause between priority groups.
    #[serde(default = "default_group_pause_ms")]
    pub group_pause_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            feeds: default_feeds(),
            output: default_output(),
            per_feed_limit: default_per_feed_limit(),
            request_spacing_ms: default_request_spacing_ms(),
            group_pause_ms: default_group_pause_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub default_sort: SortKey,
    #[serde(default = "default_search_fields")]
    pub search_fields: Vec<String>,
    /// Serve the embedded mock set when every source fails.
    #[serde(default = "default_true")]
    pub mock_fallback: bool,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceSpec>,
    #[serde(default = "default_refresh_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_update_check_secs")]
    pub update_check_secs: u64,
    #[serde(default = "default_debounce_ms")]
    pub search_debounce_ms: u64,
    #[serde(default = "default_throttle_ms")]
    pub scroll_throttle_ms: u64,
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,
    #[serde(default)]
    pub collector: CollectorConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            default_sort: SortKey::Time,
            search_fields: default_search_fields(),
            mock_fallback: true,
            sources: default_sources(),
            refresh_interval_secs: default_refresh_secs(),
            update_check_secs: default_update_check_secs(),
            search_debounce_ms: default_debounce_ms(),
            scroll_throttle_ms: default_throttle_ms(),
            session_path: default_session_path(),
            collector: CollectorConfig::default(),
        }
    }
}

impl FeedConfig {
    /// Load from an explicit path. `.json` is read as JSON, anything else as TOML.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading feed config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let mut cfg: FeedConfig = if ext == "json" {
            serde_json::from_str(&content)
                .with_context(|| format!("parsing feed config json {}", path.display()))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("parsing feed config toml {}", path.display()))?
        };
        cfg.sanitize();
        Ok(cfg)
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $FEED_CONFIG_PATH
    /// 2) config/feed.toml
    /// 3) config/feed.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut cfg = Self::load_file_default()?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn load_file_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            } else {
                return Err(anyhow!("FEED_CONFIG_PATH points to non-existent path"));
            }
        }
        let toml_p = PathBuf::from("config/feed.toml");
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        let json_p = PathBuf::from("config/feed.json");
        if json_p.exists() {
            return Self::load_from(&json_p);
        }
        Ok(Self::default())
    }

    /// `FEED_PAGE_SIZE` and `FEED_MOCK_FALLBACK` win over file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var(ENV_PAGE_SIZE) {
            match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.page_size = n,
                _ => tracing::warn!(target: "config", value = %v, "ignoring invalid FEED_PAGE_SIZE"),
            }
        }
        if let Ok(v) = std::env::var(ENV_MOCK_FALLBACK) {
            self.mock_fallback = !matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }
    }

    fn sanitize(&mut self) {
        if self.page_size == 0 {
            self.page_size = default_page_size();
        }
        if self.refresh_interval_secs == 0 {
            self.refresh_interval_secs = default_refresh_secs();
        }
        if self.update_check_secs == 0 {
            self.update_check_secs = default_update_check_secs();
        }
    }

    /// Configured search fields; unknown names are skipped, and an empty
    /// result means the defaults.
    pub fn fields(&self) -> Vec<Field> {
        let mut out = Vec::new();
        for raw in &self.search_fields {
            match Field::parse(raw) {
                Some(f) if !out.contains(&f) => out.push(f),
                Some(_) => {}
                None => tracing::warn!(target: "config", field = %raw, "unknown search field"),
            }
        }
        if out.is_empty() {
            DEFAULT_SEARCH_FIELDS.to_vec()
        } else {
            out
        }
    }
}
