// src/feed/sources.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use super::types::{FeedPayload, FeedSource};
use crate::config::SourceConfig;

/// A configured feed endpoint fetched over HTTP. Non-2xx responses count as
/// fetch failures so the orchestrator can isolate them.
pub struct HttpFeedSource {
    id: String,
    url: String,
    client: reqwest::Client,
}

impl HttpFeedSource {
    pub fn new(cfg: &SourceConfig) -> Self {
        Self {
            id: cfg.id.clone(),
            url: cfg.url.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self) -> Result<FeedPayload> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("GET {}", self.url))?
            .error_for_status()
            .with_context(|| format!("non-success status from {}", self.url))?;

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp
            .text()
            .await
            .with_context(|| format!("reading body from {}", self.url))?;

        Ok(FeedPayload { body, content_type })
    }

    fn id(&self) -> &str {
        &self.id
    }
}
