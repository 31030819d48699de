//! stripe-ntfy - Relays verified Stripe webhooks to an ntfy topic.
//!
//! Configuration comes from the environment; see `Config::from_env`.

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stripe_ntfy::{router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("relay_starting");

    // Missing required variables end the process here with a diagnostic
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        listen_addr = %config.listen_addr,
        ntfy_host = config.ntfy.url.host_str().unwrap_or(""),
        ntfy_auth = config.ntfy.auth.scheme(),
        ntfy_timeout_ms = config.ntfy.timeout.map(|t| t.as_millis() as u64),
        signature_tolerance_secs = config.signature_tolerance.as_secs(),
        "config_loaded"
    );

    let addr = config.listen_addr;
    let state = AppState::from_config(config).context("Failed to create ntfy client")?;
    let app = router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Unable to listen on {}", addr))?;

    info!(address = %addr, "relay_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("relay_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("relay_shutting_down");
}
