//! Health check endpoints.

use crate::metrics::Metrics;
use crate::middleware::InstrumentLayer;
use crate::state::AppState;
use axum::{
    body::Body,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

/// Registers health check routes, instrumented like any other API route.
pub fn routes(metrics: Metrics) -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health_check))
        .route_layer(InstrumentLayer::new(metrics))
}

/// Simple health check endpoint.
///
/// Returns a 200 OK status to indicate the service is running.
async fn health_check() -> impl IntoResponse {
    Response::new(Body::from("OK"))
}
