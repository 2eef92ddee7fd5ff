// src/feed/mod.rs
pub mod filter;
pub mod map;
pub mod parse;
pub mod sources;
pub mod types;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

pub use types::{CanonicalRecord, FeedSource, FilterContext, RawPayload, RunReport};

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_items_total", "Raw items parsed from all sources.");
        describe_counter!(
            "feed_kept_total",
            "Records surviving freshness + keyword filters."
        );
        describe_counter!("feed_dedup_total", "Records removed by deduplication.");
        describe_counter!(
            "feed_source_errors_total",
            "Source fetch/parse errors (isolated per source)."
        );
    });
}

/// Collapse duplicates (first encountered wins) and order newest-first.
/// Unparsable timestamps sort as the oldest possible instant, so they sink to
/// the bottom; the sort is stable, so ties keep their post-dedup order.
pub fn dedup_and_sort(records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept = Vec::with_capacity(records.len());
    let mut dropped = 0usize;

    for rec in records {
        if seen.insert(rec.dedup_key()) {
            kept.push(rec);
        } else {
            dropped += 1;
        }
    }
    counter!("feed_dedup_total").increment(dropped as u64);

    kept.sort_by_cached_key(|r| {
        std::cmp::Reverse(r.published_instant().unwrap_or(DateTime::<Utc>::MIN_UTC))
    });
    kept
}

/// Run the full pipeline over already-fetched payloads: per source
/// detect -> parse -> map -> filter, merge in source order, then dedup+sort.
/// A bad payload contributes zero records and never affects its siblings.
pub fn run_pipeline(payloads: &[RawPayload], ctx: &FilterContext) -> Vec<CanonicalRecord> {
    ensure_metrics_described();

    let mut merged = Vec::new();
    for payload in payloads {
        let items = parse::parse_feed(payload);
        counter!("feed_items_total").increment(items.len() as u64);

        for item in items {
            let rec = map::to_record(item, &payload.source_id);
            let haystack = format!("{} {}", rec.title, rec.summary);
            if filter::is_fresh(&rec.published_at, ctx)
                && filter::matches_keywords(&haystack, &ctx.keywords)
            {
                merged.push(rec);
            }
        }
    }

    let out = dedup_and_sort(merged);
    counter!("feed_kept_total").increment(out.len() as u64);
    out
}

/// Fetch every source and run the pipeline once. Sources are awaited in their
/// configured order, so output is deterministic; a rejected fetch is logged
/// and contributes nothing.
pub async fn run_once(sources: &[Box<dyn FeedSource>], ctx: &FilterContext) -> Vec<CanonicalRecord> {
    ensure_metrics_described();

    let mut payloads = Vec::with_capacity(sources.len());
    for src in sources {
        match src.fetch().await {
            Ok(p) => payloads.push(RawPayload {
                source_id: src.id().to_string(),
                body: p.body,
                content_type: p.content_type,
            }),
            Err(e) => {
                tracing::warn!(error = ?e, source = src.id(), "source fetch failed");
                counter!("feed_source_errors_total").increment(1);
            }
        }
    }

    run_pipeline(&payloads, ctx)
}
