//! # Curbside
//!
//! Paid curbside parking sessions over a third-party rate vendor.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export VENDOR_API_BASE_URL=https://api.parkvendor.example
//! export VENDOR_API_TOKEN=...
//! export LEDGER_API_BASE_URL=https://ledger.internal
//! export LEDGER_API_TOKEN=...
//!
//! # Run the server
//! curbside
//! ```

use curb_api::{routes, state::AppState, worker};
use tokio::sync::watch;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    let (state, reminders) = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Pricing policy: {}", state.orchestrator.policy());
    info!("Scan interval: {:?}", state.settings.scan_interval());

    let (scanner_stop, scanner_rx) = watch::channel(false);
    let (dispatcher_stop, dispatcher_rx) = watch::channel(false);
    let scanner = worker::spawn_scanners(
        state.scanner.clone(),
        state.settings.scan_interval(),
        scanner_rx,
    );
    let dispatcher = worker::spawn_reminder_dispatcher(reminders, dispatcher_rx);

    let app = routes::create_router(state);

    info!("Curbside starting on http://{}", addr);
    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Quotes: POST http://{}/api/v1/quotes", addr);
        info!("Sessions: POST http://{}/api/v1/sessions", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
        })
        .await?;

    // Scanner first, so nothing is enqueued after the dispatcher drains.
    scanner_stop.send(true).ok();
    scanner.await?;
    dispatcher_stop.send(true).ok();
    let dispatched = dispatcher.await?;
    info!(dispatched, "Workers stopped");

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  Curbside
  ━━━━━━━━━━━━━━━━━━━━━━━
  Paid parking sessions
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
