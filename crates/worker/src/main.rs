//! `intake-worker` -- contact intake event worker.
//!
//! Receives platform events over HTTP, validates committed contact records
//! and forwards submitted workbooks to the configured webhook. See
//! [`WorkerConfig::from_env`] for the environment variables it reads.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use intake_core::platform::PlatformApi;
use intake_events::{DeliveryTarget, EventBus, WebhookDelivery};
use intake_platform::PlatformClient;
use intake_worker::config::WorkerConfig;
use intake_worker::listeners::{build_listener, drain_listener};
use intake_worker::server;
use intake_worker::submit::SubmitConfig;

/// How long queued events may keep the listener busy after the server stops.
const LISTENER_DRAIN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = WorkerConfig::from_env().context("Invalid worker configuration")?;

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "intake_worker=debug,intake_events=debug,tower_http=info".into());
    if config.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
    tracing::info!(?config, "Loaded worker configuration");

    // --- Collaborators ---
    let platform: Arc<dyn PlatformApi> = Arc::new(PlatformClient::new(
        config.platform_api_url.clone(),
        config.platform_api_key.clone(),
    ));
    let delivery: Arc<dyn DeliveryTarget> = Arc::new(
        WebhookDelivery::new(config.webhook_url.clone(), config.webhook_destination.clone())
            .context("Failed to build webhook client")?,
    );

    // --- Event bus + listener ---
    let event_bus = Arc::new(EventBus::default());
    let listener = build_listener(
        &config.listener_namespace,
        platform,
        delivery,
        SubmitConfig {
            method_tag: config.submit_method_tag.clone(),
        },
    )?;
    tracing::info!(handlers = listener.handler_count(), "Listener registered");

    let cancel = CancellationToken::new();
    let listener_handle = tokio::spawn(listener.run(event_bus.subscribe(), cancel.clone()));

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().context("Invalid HOST address")?,
        config.port,
    );
    tracing::info!(%addr, "Starting event intake server");

    let tcp = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(tcp, server::router(Arc::clone(&event_bus)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting events, draining listener");
    drop(event_bus);
    let outcome = drain_listener(listener_handle, &cancel, LISTENER_DRAIN_GRACE).await;
    tracing::info!(?outcome, "Listener stopped");

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
