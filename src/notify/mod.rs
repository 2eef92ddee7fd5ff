// src/notify/mod.rs
pub mod email;

use chrono::{DateTime, Utc};

use crate::feed::CanonicalRecord;

pub use email::EmailSender;

/// Failures of the notification collaborator. Missing configuration is fatal
/// for the send attempt only; the pipeline result is already computed by the
/// time this surfaces.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("missing notification config: {0}")]
    MissingConfig(&'static str),
    #[error("invalid notification config: {0}")]
    InvalidConfig(String),
    #[error("building email failed: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp send failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Render the ordered records as an HTML list. Every free-text field is
/// escaped; a record without a link gets an explicit placeholder, and the
/// timestamp falls back to its raw text when it does not parse.
pub fn render_digest_html(records: &[CanonicalRecord]) -> String {
    let mut out = String::from("<ul>\n");
    for rec in records {
        out.push_str("  <li>");
        if rec.link.is_empty() {
            out.push_str(&format!(
                "<strong>{}</strong> (no link)",
                html_escape::encode_safe(&rec.title)
            ));
        } else {
            out.push_str(&format!(
                "<a href=\"{}\"><strong>{}</strong></a>",
                html_escape::encode_safe(&rec.link),
                html_escape::encode_safe(&rec.title)
            ));
        }
        out.push_str(&format!(
            "<br>{} &middot; {}</li>\n",
            html_escape::encode_safe(&display_timestamp(rec)),
            html_escape::encode_safe(&rec.source_id)
        ));
    }
    out.push_str("</ul>\n");
    out
}

fn display_timestamp(rec: &CanonicalRecord) -> String {
    match rec.published_instant() {
        Some(ts) => format_local(ts),
        None => rec.published_at.clone(),
    }
}

fn format_local(ts: DateTime<Utc>) -> String {
    ts.format("%d.%m.%Y %H:%M UTC").to_string()
}
