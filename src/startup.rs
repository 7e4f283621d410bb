//! Application startup and server initialization.
//!
//! This module handles the creation and configuration of the HTTP server,
//! including initialization of the metrics registry and route setup.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ConfigV1;
use crate::metrics::Metrics;
use crate::routes;
use crate::state::AppState;

/// Builds the shared state from the configuration.
///
/// # Errors
///
/// Returns an error if the metrics registry cannot be built, e.g. because the
/// configured histogram buckets are not strictly increasing.
pub fn build_state(config: Arc<ConfigV1>) -> Result<AppState, Box<dyn std::error::Error>> {
    let metrics = Metrics::new(&config.metrics)?;
    Ok(AppState { config, metrics })
}

/// Initializes and runs the application server.
///
/// Sets up the metrics registry and the HTTP server with configured routes.
/// Binds to the address specified in the configuration and starts serving
/// requests until the process receives Ctrl-C.
///
/// # Errors
///
/// Returns an error if the server fails to bind to the specified address
/// or encounters a runtime error during execution.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(config.clone())?;
    let app = routes::create_app(state);

    info!("Starting server on {}", config.bind_address);
    for rule in &config.rewrites {
        info!("Rewriting {} to {}", rule.source, rule.destination);
    }

    let listener = TcpListener::bind(&config.bind_address).await?;

    axum::serve(
        listener,
        axum::ServiceExt::<axum::extract::Request>::into_make_service(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Could not listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
