//! HTTP route definitions and handlers.
//!
//! This module organizes the HTTP endpoints into logical groups
//! (metrics exposition and health checks) and assembles the service stack:
//! rewrites in front of the router, request timing around every route.

mod health_routes;
mod metrics_routes;

use crate::metrics::Metrics;
use crate::middleware::{request_timing, Rewrite, RewriteLayer, Rewrites};
use crate::state::AppState;
use axum::{middleware, Router};
use tower::Layer;

/// Creates the application router with all configured routes.
///
/// Combines all route modules into a single router, adds the request
/// timing middleware and attaches the application state.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(metrics_routes::routes::<AppState, Metrics>())
        .merge(health_routes::routes(state.metrics.clone()))
        .layer(middleware::from_fn_with_state(state.clone(), request_timing))
        .with_state(state)
}

/// Creates the servable application: the router behind the configured rewrites.
///
/// Rewrites must run before routing, so they wrap the router instead of
/// being one of its layers.
pub fn create_app(state: AppState) -> Rewrite<Router> {
    let rewrites = Rewrites::new(state.config.rewrites.clone());
    RewriteLayer::new(rewrites).layer(create_router(state))
}
