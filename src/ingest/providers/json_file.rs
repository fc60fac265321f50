use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

use crate::ingest::parse_document;
use crate::ingest::types::{DataSource, RawNewsItem};

/// A JSON snapshot on disk, typically written by the collector.
pub struct JsonFileSource {
    name: String,
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl DataSource for JsonFileSource {
    async fn fetch(&self) -> Result<Vec<RawNewsItem>> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading {}", self.path.display()))?;
        parse_document(&body).with_context(|| format!("parsing {}", self.path.display()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
