// src/feed/filter.rs
//! Text normalization, keyword matching, and the freshness window.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use time::{format_description::well_known::Rfc2822, OffsetDateTime};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use super::types::FilterContext;

/// Canonicalize free text for matching: lowercase, strip diacritics via NFD,
/// and turn every char that is not a letter, number, or whitespace into a
/// single space. Idempotent, so normalized keywords can be matched against
/// normalized text directly.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.nfd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() || ch.is_whitespace() {
            out.extend(ch.to_lowercase());
        } else {
            out.push(' ');
        }
    }
    out
}

/// OR-match: true when the normalized text contains the normalized form of
/// any keyword. Substring containment, no word boundaries. Empty text or an
/// empty keyword list never matches.
pub fn matches_keywords(text: &str, keywords: &[String]) -> bool {
    if text.trim().is_empty() || keywords.is_empty() {
        return false;
    }
    let haystack = normalize(text);
    keywords.iter().any(|kw| {
        let needle = normalize(kw);
        !needle.trim().is_empty() && haystack.contains(&needle)
    })
}

/// Lenient timestamp parse: RFC 2822 (the RSS convention), then RFC 3339,
/// then a few naive formats assumed UTC. None when nothing fits.
pub fn parse_publish_instant(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(odt) = OffsetDateTime::parse(s, &Rfc2822) {
        return DateTime::from_timestamp(odt.unix_timestamp(), odt.nanosecond());
    }
    // Real-world RSS still carries obsolete RFC 2822 zones ("GMT", "EST");
    // chrono accepts those.
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// True iff the raw timestamp parses and falls inside the trailing window
/// `[reference - window_minutes, reference]`, both ends inclusive. Unparsable
/// or missing timestamps are not fresh; future-dated entries are excluded.
/// A window length that overflows the duration arithmetic (the value is
/// caller-supplied) makes nothing fresh instead of panicking the run.
pub fn is_fresh(published_at_raw: &str, ctx: &FilterContext) -> bool {
    let Some(instant) = parse_publish_instant(published_at_raw) else {
        return false;
    };
    let Some(window) = Duration::try_minutes(ctx.window_minutes) else {
        return false;
    };
    let Some(floor) = ctx.reference_instant.checked_sub_signed(window) else {
        return false;
    };
    instant >= floor && instant <= ctx.reference_instant
}
