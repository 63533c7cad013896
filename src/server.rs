//! HTTP server initialization and runtime setup.
//!
//! Handles store and provider setup, background task spawning, and the Axum
//! server lifecycle.

use crate::application::Pipeline;
use crate::application::services::AuthService;
use crate::bootstrap::build_pipeline;
use crate::config::Config;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Backing store (Redis, or in-memory when unconfigured)
/// - Image provider and vocabulary source
/// - Embedded worker, when `IMAGE_WORKER_EMBEDDED` is true
/// - Populator schedule, when `IMAGE_POPULATE_INTERVAL_SECONDS` is set
/// - Axum HTTP server
///
/// On Ctrl+C or SIGTERM the server stops accepting connections, then the
/// background tasks finish their current step and exit.
///
/// # Errors
///
/// Returns an error if:
/// - `ADMIN_TOKEN` is not set
/// - A configured backend is unreachable
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let auth_service = Arc::new(
        AuthService::new(config.require_admin_token()?)
            .context("Failed to initialize admin token check")?,
    );

    let pipeline = Arc::new(build_pipeline(&config).await?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let background = spawn_background(&config, &pipeline, shutdown_rx);

    let state = AppState::new(pipeline, auth_service);
    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("HTTP server stopped, waiting for background tasks");
    let _ = shutdown_tx.send(true);
    for handle in background {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Background task panicked");
        }
    }

    Ok(())
}

fn spawn_background(
    config: &Config,
    pipeline: &Pipeline,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::new();

    if config.worker_embedded {
        let worker = pipeline.worker();
        let rx = shutdown.clone();
        handles.push(tokio::spawn(async move { worker.run(rx).await }));
        tracing::info!("Embedded worker started");
    } else {
        tracing::info!("Embedded worker disabled, expecting an external image-worker");
    }

    if let Some(secs) = config.populate_interval_seconds {
        let populator = pipeline.populator();
        let interval = Duration::from_secs(secs);
        handles.push(tokio::spawn(async move {
            populator.run_periodic(interval, shutdown).await
        }));
    }

    handles
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM");
        },
    }
}
