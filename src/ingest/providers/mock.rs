use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;

use crate::ingest::parse_document;
use crate::ingest::types::{DataSource, RawNewsItem};

/// The embedded demo data set served when no real data loads.
pub const MOCK_JSON: &str = include_str!("../../../data/mock_news.json");

static MOCK_RECORDS: Lazy<Vec<RawNewsItem>> = Lazy::new(|| match parse_document(MOCK_JSON) {
    Ok(v) => v,
    Err(e) => {
        tracing::error!(target: "ingest", error = ?e, "embedded mock set failed to parse");
        Vec::new()
    }
});

/// Records of the embedded set, already parsed.
pub fn mock_records() -> Vec<RawNewsItem> {
    MOCK_RECORDS.clone()
}

pub struct MockSource;

#[async_trait]
impl DataSource for MockSource {
    async fn fetch(&self) -> Result<Vec<RawNewsItem>> {
        let v = mock_records();
        anyhow::ensure!(!v.is_empty(), "embedded mock set is empty");
        Ok(v)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_set_has_twelve_records() {
        let v = mock_records();
        assert_eq!(v.len(), 12);
        assert!(v.iter().all(|r| r.title.is_some() && r.importance.is_some()));
    }
}
