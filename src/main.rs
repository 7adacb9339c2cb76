// =============================================================================
// Ticker Insight — Main Entry Point
// =============================================================================
//
// Loads the runtime config, builds the shared state and serves the REST API
// until Ctrl+C.
// =============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ticker_insight::api;
use ticker_insight::app_state::AppState;
use ticker_insight::runtime_config::RuntimeConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & logging ─────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Ticker Insight starting up");

    // ── 2. Runtime config ────────────────────────────────────────────────
    let config_path = PathBuf::from(
        std::env::var("TICKER_INSIGHT_CONFIG").unwrap_or_else(|_| "runtime_config.json".into()),
    );

    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    if let Ok(bind) = std::env::var("TICKER_INSIGHT_BIND") {
        config.bind_addr = bind;
    }

    info!(
        bind_addr = %config.bind_addr,
        quote_source = %config.quote_source.base_url,
        range = %config.quote_source.range,
        default_shares = config.default_shares,
        "Runtime config ready"
    );

    // ── 3. Shared state ──────────────────────────────────────────────────
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, Some(config_path))?);

    // Fail at startup rather than on the first request.
    state.engine().context("engine config is unusable")?;

    // ── 4. API server ────────────────────────────────────────────────────
    let app = api::rest::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server to {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
            warn!("Shutdown signal received, stopping gracefully");
        })
        .await
        .context("API server failed")?;

    info!(analyses = state.analyses_served(), "Ticker Insight shut down complete.");
    Ok(())
}
