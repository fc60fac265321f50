use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;

use crate::ingest::parse_document;
use crate::ingest::types::{DataSource, RawNewsItem};

/// A JSON snapshot fetched over HTTP. Non-2xx responses count as failures.
pub struct HttpJsonSource {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl HttpJsonSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl DataSource for HttpJsonSource {
    async fn fetch(&self) -> Result<Vec<RawNewsItem>> {
        let t0 = std::time::Instant::now();
        let body = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("GET {}", self.url))?
            .error_for_status()
            .with_context(|| format!("GET {} status", self.url))?
            .text()
            .await
            .context("http .text()")?;
        histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        parse_document(&body).with_context(|| format!("parsing {}", self.url))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
