// src/feed/parse.rs
//! Format detection and tolerant RSS/Atom/JSON parsing.
//!
//! Both XML dialects are folded into one scalar-per-field [`XmlItem`] at this
//! boundary, so downstream code never sees "array or scalar" shapes. A parse
//! failure degrades to zero items for that source and never aborts the run.

use metrics::counter;
use quick_xml::de::from_str;
use serde::Deserialize;
use serde_json::Value;

use super::types::RawPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Xml,
    Json,
}

/// A source-specific item, tagged by origin so the mapper can apply the
/// fallback table that matches the feed dialect.
#[derive(Debug, Clone)]
pub enum RawItem {
    Xml(XmlItem),
    Json(serde_json::Map<String, Value>),
}

/// RSS and Atom item fields, already normalized to optional scalars.
#[derive(Debug, Clone, Default)]
pub struct XmlItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub guid: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub pub_date: Option<String>,
    pub published: Option<String>,
    pub updated: Option<String>,
}

/// JSON if the hint says so or the trimmed body opens an object; XML else.
pub fn detect_kind(payload: &RawPayload) -> FeedKind {
    let hint = payload.content_type.as_deref().unwrap_or("");
    if hint.to_ascii_lowercase().contains("json") || payload.body.trim_start().starts_with('{') {
        FeedKind::Json
    } else {
        FeedKind::Xml
    }
}

/// Parse one payload into its raw items. Never fails: bad payloads are logged
/// and contribute an empty collection.
pub fn parse_feed(payload: &RawPayload) -> Vec<RawItem> {
    match detect_kind(payload) {
        FeedKind::Json => parse_json(payload),
        FeedKind::Xml => parse_xml(payload),
    }
}

// ---------- XML (RSS / Atom) ----------

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    guid: Option<TextNode>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Atom {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<TextNode>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    id: Option<String>,
    summary: Option<TextNode>,
    published: Option<String>,
    updated: Option<String>,
}

/// Element that may carry attributes (guid isPermaLink, Atom type=) around
/// its text content.
#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "$text")]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
}

fn parse_xml(payload: &RawPayload) -> Vec<RawItem> {
    let xml = scrub_entities_for_xml(&payload.body);

    if let Ok(rss) = from_str::<Rss>(&xml) {
        return rss
            .channel
            .items
            .into_iter()
            .map(|it| {
                RawItem::Xml(XmlItem {
                    title: it.title,
                    link: it.link,
                    guid: it.guid.and_then(|g| g.value),
                    description: it.description,
                    pub_date: it.pub_date,
                    ..Default::default()
                })
            })
            .collect();
    }

    match from_str::<Atom>(&xml) {
        Ok(atom) => atom
            .entries
            .into_iter()
            .map(|e| {
                RawItem::Xml(XmlItem {
                    title: e.title.and_then(|t| t.value),
                    link: e.links.into_iter().find_map(|l| l.href),
                    guid: e.id,
                    summary: e.summary.and_then(|s| s.value),
                    published: e.published,
                    updated: e.updated,
                    ..Default::default()
                })
            })
            .collect(),
        Err(e) => {
            tracing::warn!(error = ?e, source = %payload.source_id, "unparsable xml feed");
            counter!("feed_source_errors_total").increment(1);
            Vec::new()
        }
    }
}

/// Loose HTML entities that are not valid XML entities show up in real-world
/// RSS; swap them before deserialization.
fn scrub_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

// ---------- JSON search APIs ----------

const JSON_ITEM_FIELDS: [&str; 2] = ["opportunitiesData", "data"];

fn parse_json(payload: &RawPayload) -> Vec<RawItem> {
    let value: Value = match serde_json::from_str(&payload.body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = ?e, source = %payload.source_id, "unparsable json feed");
            counter!("feed_source_errors_total").increment(1);
            return Vec::new();
        }
    };

    let items = JSON_ITEM_FIELDS
        .iter()
        .find_map(|f| value.get(*f).and_then(Value::as_array));

    match items {
        Some(arr) => arr
            .iter()
            .filter_map(|v| v.as_object().cloned())
            .map(RawItem::Json)
            .collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(body: &str, hint: Option<&str>) -> RawPayload {
        RawPayload {
            source_id: "test".into(),
            body: body.to_string(),
            content_type: hint.map(str::to_string),
        }
    }

    #[test]
    fn detection_prefers_hint_then_body_shape() {
        assert_eq!(
            detect_kind(&payload("<rss/>", Some("application/json"))),
            FeedKind::Json
        );
        assert_eq!(detect_kind(&payload(r#"  {"data":[]}"#, None)), FeedKind::Json);
        assert_eq!(
            detect_kind(&payload("<?xml version=\"1.0\"?><rss/>", Some("text/xml"))),
            FeedKind::Xml
        );
    }

    #[test]
    fn rss_items_are_extracted() {
        let body = r#"<rss version="2.0"><channel><title>feed</title>
            <item><title>Tents</title><link>https://x.test/1</link>
              <guid isPermaLink="false">tag-1</guid>
              <description>Big tents</description>
              <pubDate>Tue, 01 Jul 2025 10:00:00 GMT</pubDate></item>
        </channel></rss>"#;
        let items = parse_feed(&payload(body, Some("application/rss+xml")));
        assert_eq!(items.len(), 1);
        let RawItem::Xml(it) = &items[0] else {
            panic!("expected xml item")
        };
        assert_eq!(it.title.as_deref(), Some("Tents"));
        assert_eq!(it.link.as_deref(), Some("https://x.test/1"));
        assert_eq!(it.guid.as_deref(), Some("tag-1"));
    }

    #[test]
    fn atom_entries_are_extracted() {
        let body = r#"<feed xmlns="http://www.w3.org/2005/Atom">
            <entry><title>HVAC works</title>
              <link href="https://x.test/a"/>
              <id>urn:uuid:1</id>
              <summary>chillers</summary>
              <updated>2025-07-01T10:00:00Z</updated></entry>
        </feed>"#;
        let items = parse_feed(&payload(body, None));
        assert_eq!(items.len(), 1);
        let RawItem::Xml(it) = &items[0] else {
            panic!("expected xml item")
        };
        assert_eq!(it.title.as_deref(), Some("HVAC works"));
        assert_eq!(it.link.as_deref(), Some("https://x.test/a"));
        assert_eq!(it.updated.as_deref(), Some("2025-07-01T10:00:00Z"));
    }

    #[test]
    fn json_items_come_from_known_array_fields() {
        let body = r#"{"opportunitiesData":[{"title":"Generator"}],"total":1}"#;
        let items = parse_feed(&payload(body, Some("application/json")));
        assert_eq!(items.len(), 1);

        let body = r#"{"data":[{"title":"A"},{"title":"B"}]}"#;
        assert_eq!(parse_feed(&payload(body, None)).len(), 2);
    }

    #[test]
    fn garbage_payloads_degrade_to_empty() {
        assert!(parse_feed(&payload("{not json", Some("application/json"))).is_empty());
        assert!(parse_feed(&payload("definitely not xml <", None)).is_empty());
        assert!(parse_feed(&payload(r#"{"unknown":[1]}"#, None)).is_empty());
    }
}
