// src/api.rs
//! HTTP trigger surface: /health, /listings (structured result), and /run
//! (pipeline + email digest).

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;

use crate::config::WatchConfig;
use crate::feed::{self, FeedSource, FilterContext, RunReport};
use crate::feed::sources::HttpFeedSource;
use crate::notify::{EmailSender, NotifyError};

#[derive(Clone)]
pub struct AppState {
    cfg: Arc<WatchConfig>,
}

pub fn create_router(cfg: WatchConfig) -> Router {
    let state = AppState { cfg: Arc::new(cfg) };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/listings", get(listings))
        .route("/run", get(run))
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct RunParams {
    #[serde(default)]
    dry_run: bool,
    /// Optional freshness-window override in minutes.
    window: Option<i64>,
}

/// One pipeline run against the configured sources. The reference instant is
/// captured here so every record is judged against the same "now".
async fn collect(cfg: &WatchConfig, window_override: Option<i64>) -> RunReport {
    let ctx = FilterContext {
        keywords: cfg.keywords.clone(),
        window_minutes: window_override.unwrap_or(cfg.window_minutes),
        reference_instant: Utc::now(),
    };
    let sources: Vec<Box<dyn FeedSource>> = cfg
        .sources
        .iter()
        .map(|s| Box::new(HttpFeedSource::new(s)) as Box<dyn FeedSource>)
        .collect();

    let items = feed::run_once(&sources, &ctx).await;
    RunReport::new(items, ctx.reference_instant)
}

/// Structured result for machine consumers; never notifies.
async fn listings(
    State(state): State<AppState>,
    Query(params): Query<RunParams>,
) -> Json<RunReport> {
    Json(collect(&state.cfg, params.window).await)
}

/// Full run: filter, dedup, then mail the digest unless dry-run or empty.
async fn run(State(state): State<AppState>, Query(params): Query<RunParams>) -> Response {
    let report = collect(&state.cfg, params.window).await;

    if params.dry_run {
        return format!(
            "dry run: {} fresh listings, notification skipped",
            report.count
        )
        .into_response();
    }
    if report.count == 0 {
        return "no fresh listings".into_response();
    }

    let sender = match EmailSender::from_env() {
        Ok(s) => s,
        Err(e) => return notify_failure(e),
    };
    if let Err(e) = sender.send_digest(&report.items).await {
        return notify_failure(e);
    }

    tracing::info!(count = report.count, "digest sent");
    Json(report).into_response()
}

fn notify_failure(err: NotifyError) -> Response {
    tracing::error!(error = %err, "notification failed");
    let status = match err {
        NotifyError::MissingConfig(_) | NotifyError::InvalidConfig(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        NotifyError::Build(_) | NotifyError::Smtp(_) => StatusCode::BAD_GATEWAY,
    };
    (status, format!("notification failed: {err}")).into_response()
}
