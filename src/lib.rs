// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod feed;
pub mod notify;

// ---- Re-exports for stable public API ----
pub use crate::api::create_router;
pub use crate::config::{SourceConfig, WatchConfig};
pub use crate::feed::{CanonicalRecord, FeedSource, FilterContext, RawPayload, RunReport};
pub use crate::notify::{render_digest_html, NotifyError};
