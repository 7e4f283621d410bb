//! Shared application state.
//!
//! Contains the state that is shared across all request handlers:
//! the configuration and the metrics registry.

use crate::config::ConfigV1;
use crate::metrics::Metrics;
use axum::extract::FromRef;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// This state is cloned for each request handler; both fields are cheap,
/// reference-counted handles.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// Registry of API request metrics.
    pub metrics: Metrics,
}

impl FromRef<AppState> for Metrics {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}
