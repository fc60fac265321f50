// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};

/// Lenient wire record as found in JSON snapshots. Every field is optional;
/// both the collector schema (`importance_score`, `published_date`) and the
/// dashboard schema (`importance`, `isNew`) are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNewsItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        default,
        rename = "importance_score",
        alias = "importance",
        deserialize_with = "lenient_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub importance: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_keywords",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub keywords: Vec<String>,
    #[serde(
        default,
        rename = "published_date",
        alias = "published_at",
        skip_serializing_if = "Option::is_none"
    )]
    pub published: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
    #[serde(default, alias = "isNew", skip_serializing_if = "Option::is_none")]
    pub is_new: Option<bool>,
    #[serde(default, alias = "isTrending", skip_serializing_if = "Option::is_none")]
    pub is_trending: Option<bool>,
}

/// Number or numeric string; anything else reads as no score.
fn lenient_score<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<f64>, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    Ok(match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite()))
}

/// List of strings, or a single comma-separated string. Non-string entries
/// are dropped; null or any other shape reads as empty.
fn lenient_keywords<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<String>, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    Ok(match v {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|k| match k {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        serde_json::Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    })
}

/// A place items can be loaded from. Each fetch returns a full replacement set.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RawNewsItem>>;
    fn name(&self) -> &str;
}
