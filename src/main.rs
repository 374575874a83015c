//! Application entry point for the `birdmap-tracker` backend service.
//!
//! This binary orchestrates the full startup sequence for the dashboard API,
//! including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Resolving the data-source secret and building a lazily connected pool
//! - Loading the marker icon
//! - Mounting all API routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! A missing secret or icon does not stop the server: the former leaves the
//! data routes answering with a configuration error, the latter only drops
//! the icon from the map markers.
//!
//! # Environment Variables
//! - `DETECTIONS_DATABASE_URL` (**required**) – detections database
//! - `DETECTIONS_API_KEY` / `DETECTIONS_API_KEY_FILE` – data-source secret
//! - `AXUM_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `AXUM_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See `config.rs` for the remaining options.
use std::{env, io::IsTerminal, sync::Arc};

use anyhow::Result;
use axum::{body::Bytes, Router};
use dotenvy::dotenv;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use birdmap_tracker::config::{self, API_KEY_ENV};
use birdmap_tracker::{routes, AppState, Config, DetectionSource, PgDetectionSource};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let state = build_state(&cfg).with_icon(load_icon(&cfg).await);

    // Build app from routes gateway (EMBP)
    let app: Router = routes::router(state);

    tracing::info!("Listening on {}", cfg.listen_addr);

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Resolve the secret and build the data source, degrading on failure.
fn build_state(cfg: &Config) -> AppState {
    // ---
    let source = config::load_api_key(env::var(API_KEY_ENV).ok(), &cfg.api_key_file).and_then(
        |key| PgDetectionSource::connect_lazy(&cfg.db_url, &key, cfg.db_pool_max, &cfg.table),
    );

    match source {
        Ok(source) => {
            tracing::info!("Data source configured for relation '{}'", cfg.table);
            let source: Arc<dyn DetectionSource> = Arc::new(source);
            AppState::new(source, cfg.snapshot_ttl)
        }
        Err(e) => {
            tracing::error!("Running without a data source: {}", e);
            AppState::degraded(e.to_string())
        }
    }
}

/// Read the marker icon; a missing file only costs the markers their icon.
async fn load_icon(cfg: &Config) -> Option<Bytes> {
    // ---
    match tokio::fs::read(&cfg.icon_path).await {
        Ok(bytes) => Some(Bytes::from(bytes)),
        Err(e) => {
            tracing::warn!(
                "Marker icon '{}' not loaded: {}",
                cfg.icon_path.display(),
                e
            );
            None
        }
    }
}

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `AXUM_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by `RUST_LOG`, else the `AXUM_LOG_LEVEL` env var
///
/// Called once at startup before any logging macros are invoked.
fn init_tracing() {
    // ---
    let span_events = match env::var("AXUM_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("AXUM_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
