//! sprinklerd: main entry point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HTTP gateway (axum)   BearerAuth   CORS   LogEventSink        │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            ControlService (pure logic)                 │    │
//! │  │  Registry · ZoneStateStore · TimerCoordinator          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  PinDriver: gpio-cdev lines  |  simulation                     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use sprinkler::adapters::auth::BearerAuth;
use sprinkler::adapters::http::{self, AppState};
use sprinkler::adapters::log_sink::LogEventSink;
use sprinkler::app::service::ControlService;
use sprinkler::config::SystemConfig;
use sprinkler::drivers;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("sprinklerd v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config = SystemConfig::load().context("invalid configuration")?;
    let addr = config.socket_addr()?;
    let registry = config.registry()?;

    // ── 3. Driver + control service ───────────────────────────
    let driver = drivers::select(&config).context("GPIO backend unavailable")?;
    let service = ControlService::new(
        registry,
        config.duration_policy(),
        driver,
        Arc::new(LogEventSink::new()),
    );
    service.initialize();

    // ── 4. Gateway ────────────────────────────────────────────
    let auth = BearerAuth::new(config.api_token.as_deref());
    if auth.enabled() {
        info!("Bearer authentication enabled for control endpoints");
    } else {
        warn!("SPRINKLER_API_TOKEN not set: control endpoints are open (development mode)");
    }
    let app = http::router(
        AppState::new(service.clone(), auth),
        &config.allowed_origins,
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot listen on {addr}"))?;
    info!("Sprinkler GPIO backend started on http://{}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // ── 5. Shutdown: every zone off, whatever happened above ─
    service.shutdown();
    info!("Sprinkler GPIO backend stopped");
    served.context("HTTP server failed")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Ctrl-C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown requested");
}
