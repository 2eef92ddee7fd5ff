//! Tender watch — binary entrypoint.
//! Boots the Axum HTTP server that exposes the run-trigger endpoints.

use std::net::SocketAddr;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tender_watch::{api, config::WatchConfig};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tender_watch=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = WatchConfig::load_default()?;
    tracing::info!(
        sources = cfg.sources.len(),
        keywords = cfg.keywords.len(),
        window_minutes = cfg.window_minutes,
        "configuration loaded"
    );

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let router = api::create_router(cfg);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router).await?;
    Ok(())
}
