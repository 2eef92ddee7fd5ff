// src/feed/map.rs
//! Maps raw feed items to [`CanonicalRecord`]s via fixed per-origin fallback
//! tables.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::{Map, Value};

use super::parse::{RawItem, XmlItem};
use super::types::CanonicalRecord;

const UNTITLED: &str = "(untitled listing)";

const JSON_LINK_FIELDS: [&str; 3] = ["link", "id", "reference"];
const JSON_DATE_FIELDS: [&str; 3] = ["publishDate", "postedDate", "modifiedDate"];

/// Build the canonical record for one raw item. Field candidates are
/// consulted in order and the first non-empty one wins; the title falls back
/// to a placeholder so it is never empty.
pub fn to_record(item: RawItem, source_id: &str) -> CanonicalRecord {
    match item {
        RawItem::Xml(it) => xml_record(it, source_id),
        RawItem::Json(obj) => json_record(&obj, source_id),
    }
}

fn xml_record(it: XmlItem, source_id: &str) -> CanonicalRecord {
    let title = first_of(&[&it.title]).unwrap_or(UNTITLED).to_string();
    let summary_raw = first_of(&[&it.description, &it.summary])
        .unwrap_or_default()
        .to_string();
    let link = resolve_link(first_of(&[&it.link, &it.guid]), &summary_raw);
    let published_at = first_of(&[&it.pub_date, &it.published, &it.updated])
        .unwrap_or_default()
        .to_string();

    CanonicalRecord {
        title: non_empty_title(clean_text(&title)),
        link,
        summary: clean_text(&summary_raw),
        published_at,
        source_id: source_id.to_string(),
    }
}

fn json_record(obj: &Map<String, Value>, source_id: &str) -> CanonicalRecord {
    let title = json_field(obj, &["title"]).unwrap_or_else(|| UNTITLED.to_string());

    // JSON search results carry the location separately; fold it into the
    // summary so keyword matching sees it.
    let description = json_field(obj, &["description"]).unwrap_or_default();
    let country = json_field(obj, &["country"]).unwrap_or_default();
    let summary_raw = format!("{description} {country}").trim().to_string();

    let link = resolve_link(json_field(obj, &JSON_LINK_FIELDS).as_deref(), &summary_raw);
    let published_at = json_field(obj, &JSON_DATE_FIELDS).unwrap_or_default();

    CanonicalRecord {
        title: non_empty_title(clean_text(&title)),
        link,
        summary: clean_text(&summary_raw),
        published_at,
        source_id: source_id.to_string(),
    }
}

/// Cleanup can empty a markup-only title; the record invariant says it never
/// stays empty.
fn non_empty_title(cleaned: String) -> String {
    if cleaned.is_empty() {
        UNTITLED.to_string()
    } else {
        cleaned
    }
}

/// First candidate that holds a non-blank value.
fn first_of<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// First named field of the object with a usable scalar; list values
/// contribute their first element.
fn json_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| obj.get(*k).and_then(scalar_of))
}

fn scalar_of(v: &Value) -> Option<String> {
    match v {
        Value::Array(items) => items.first().and_then(scalar_of),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accept the candidate only when it looks like an absolute http(s) URL;
/// otherwise scan the raw summary for the first such URL; else empty.
fn resolve_link(candidate: Option<&str>, summary_raw: &str) -> String {
    if let Some(c) = candidate {
        if is_absolute_http_url(c) {
            return c.to_string();
        }
    }
    first_url_in(summary_raw).unwrap_or_default()
}

fn is_absolute_http_url(s: &str) -> bool {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"^(?i)https?://\S+$").unwrap());
    re.is_match(s.trim())
}

fn first_url_in(text: &str) -> Option<String> {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r#"(?i)https?://[^\s<>"']+"#).unwrap());
    re.find(text).map(|m| m.as_str().to_string())
}

/// Light ingest-side cleanup for display text: decode HTML entities, strip
/// tags, collapse whitespace.
fn clean_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xml_item() -> XmlItem {
        XmlItem {
            title: Some("Namioty <b>6x12</b>".into()),
            link: Some("https://x.test/offer/1".into()),
            guid: Some("offer-1".into()),
            description: Some("Dostawa namiot&oacute;w".into()),
            pub_date: Some("Tue, 01 Jul 2025 10:00:00 GMT".into()),
            ..Default::default()
        }
    }

    #[test]
    fn xml_mapping_takes_first_non_empty_candidate() {
        let rec = to_record(RawItem::Xml(xml_item()), "rss-1");
        assert_eq!(rec.title, "Namioty 6x12");
        assert_eq!(rec.link, "https://x.test/offer/1");
        assert_eq!(rec.summary, "Dostawa namiotów");
        assert_eq!(rec.published_at, "Tue, 01 Jul 2025 10:00:00 GMT");
        assert_eq!(rec.source_id, "rss-1");
    }

    #[test]
    fn link_takes_first_non_empty_candidate_then_validates_shape() {
        // guid is consulted only when link is absent.
        let mut it = xml_item();
        it.link = None;
        it.guid = Some("https://x.test/guid/1".into());
        let rec = to_record(RawItem::Xml(it), "rss-1");
        assert_eq!(rec.link, "https://x.test/guid/1");

        // A non-empty but non-URL link wins candidate selection, fails the
        // shape check, and falls through to the summary scan, not to guid.
        let mut it = xml_item();
        it.link = Some("offer-page-1".into());
        it.guid = Some("https://x.test/guid/2".into());
        it.description = Some("details at https://x.test/deep/2 soon".into());
        let rec = to_record(RawItem::Xml(it), "rss-1");
        assert_eq!(rec.link, "https://x.test/deep/2");

        // No candidates and no URL in the summary leaves the link empty.
        let mut it = xml_item();
        it.link = None;
        it.guid = None;
        it.description = Some("no urls here".into());
        let rec = to_record(RawItem::Xml(it), "rss-1");
        assert_eq!(rec.link, "");
    }

    #[test]
    fn missing_title_gets_placeholder() {
        let it = XmlItem::default();
        let rec = to_record(RawItem::Xml(it), "rss-1");
        assert_eq!(rec.title, UNTITLED);

        let it = XmlItem {
            title: Some("<br/>".into()),
            ..Default::default()
        };
        let rec = to_record(RawItem::Xml(it), "rss-1");
        assert_eq!(rec.title, UNTITLED);
    }

    #[test]
    fn json_summary_joins_description_and_country() {
        let obj: Map<String, Value> = serde_json::from_str(
            r#"{"title":"Tent procurement","description":"container HVAC",
                "country":"Poland","id":"https://api.test/op/9",
                "publishDate":"2025-07-01T09:50:00Z"}"#,
        )
        .unwrap();
        let rec = to_record(RawItem::Json(obj), "api-1");
        assert_eq!(rec.summary, "container HVAC Poland");
        assert_eq!(rec.link, "https://api.test/op/9");
        assert_eq!(rec.published_at, "2025-07-01T09:50:00Z");
    }

    #[test]
    fn json_list_values_contribute_their_first_element() {
        let obj: Map<String, Value> = serde_json::from_str(
            r#"{"title":["First","Second"],"publishDate":["2025-07-01"]}"#,
        )
        .unwrap();
        let rec = to_record(RawItem::Json(obj), "api-1");
        assert_eq!(rec.title, "First");
        assert_eq!(rec.published_at, "2025-07-01");
    }

    #[test]
    fn json_date_fallback_order_is_publish_then_posted_then_modified() {
        let obj: Map<String, Value> = serde_json::from_str(
            r#"{"title":"t","postedDate":"2025-06-30","modifiedDate":"2025-07-02"}"#,
        )
        .unwrap();
        let rec = to_record(RawItem::Json(obj), "api-1");
        assert_eq!(rec.published_at, "2025-06-30");
    }
}
