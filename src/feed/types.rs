// src/feed/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// One listing in the normalized, source-agnostic shape.
///
/// `published_at` keeps the raw textual timestamp from the feed; parsing is
/// deferred to the freshness filter and the ranker so an unparsable date
/// still travels with the record.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CanonicalRecord {
    pub title: String,
    /// Absolute http(s) URL, or empty when no usable link was found.
    pub link: String,
    pub summary: String,
    pub published_at: String,
    pub source_id: String,
}

impl CanonicalRecord {
    /// Identity used to collapse duplicates: the link when present, else the
    /// title/timestamp pair.
    pub fn dedup_key(&self) -> String {
        if !self.link.is_empty() {
            self.link.clone()
        } else {
            format!("{}|{}", self.title, self.published_at)
        }
    }

    pub fn published_instant(&self) -> Option<DateTime<Utc>> {
        super::filter::parse_publish_instant(&self.published_at)
    }
}

/// Raw body of one fetched feed, plus the transport's content-type hint.
#[derive(Debug, Clone)]
pub struct FeedPayload {
    pub body: String,
    pub content_type: Option<String>,
}

/// A fetched payload tagged with the source it came from.
#[derive(Debug, Clone)]
pub struct RawPayload {
    pub source_id: String,
    pub body: String,
    pub content_type: Option<String>,
}

/// Per-run filter inputs. `reference_instant` is captured once at run start
/// so every record in the run is judged against the same "now".
#[derive(Debug, Clone)]
pub struct FilterContext {
    pub keywords: Vec<String>,
    pub window_minutes: i64,
    pub reference_instant: DateTime<Utc>,
}

/// Structured run output for machine consumers.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub count: usize,
    pub items: Vec<CanonicalRecord>,
}

impl RunReport {
    pub fn new(items: Vec<CanonicalRecord>, generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            count: items.len(),
            items,
        }
    }
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<FeedPayload>;
    fn id(&self) -> &str;
}
