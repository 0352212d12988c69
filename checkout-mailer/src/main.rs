//! Checkout Mailer web server.
//!
//! This binary:
//! - Receives Stripe webhooks on `/api/stripe-webhook`
//! - Verifies the signature against the raw body
//! - Sends a purchase confirmation email for completed checkout sessions
//! - Returns `{"received": true}` to Stripe

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use checkout_mailer::web::STRIPE_WEBHOOK_PATH;
use checkout_mailer::{router, AppState, Config, ResendClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration; missing secrets abort startup
    let config = Config::from_env().context("Invalid configuration")?;
    info!(
        port = config.port,
        stripe_api_version = %config.stripe_api_version,
        stripe_signature_max_age = config.stripe_signature_max_age,
        resend_api_url = %config.resend_api_url,
        email_from = %config.email_from,
        access_url_base = %config.access_url_base,
        email_timeout_ms = config.email_timeout_ms,
        body_read_timeout_ms = config.body_read_timeout_ms,
        "config_loaded"
    );

    // Create the Resend client
    let http = reqwest::Client::builder()
        .user_agent(concat!("checkout-mailer/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let mailer = ResendClient::new(
        http,
        config.resend_api_key.clone(),
        &config.resend_api_url,
        Duration::from_millis(config.email_timeout_ms),
    );
    info!(endpoint = %mailer.endpoint(), "resend_client_created");

    // Create application state
    let state = AppState::new(&config, Arc::new(mailer));

    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, webhook_path = STRIPE_WEBHOOK_PATH, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
