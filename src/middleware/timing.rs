//! Timing headers for API requests.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use tracing::warn;

use crate::state::AppState;

/// Request header carrying the wall-clock arrival time in Unix milliseconds.
pub const REQUEST_START: HeaderName = HeaderName::from_static("x-request-start");

/// Response header carrying the time spent producing the response, e.g. `12ms`.
pub const RESPONSE_TIME: HeaderName = HeaderName::from_static("x-response-time");

/// Whether `path` is `prefix` itself or lies below it.
///
/// `/api` matches `/api` and `/api/users`, but not `/apix`.
pub fn is_under_prefix(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Middleware stamping API requests with `x-request-start` and their
/// responses with `x-response-time`. Other paths pass through untouched.
pub async fn request_timing(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if !is_under_prefix(&state.config.api_prefix, request.uri().path()) {
        return next.run(request).await;
    }

    let started = Instant::now();
    request
        .headers_mut()
        .insert(REQUEST_START, HeaderValue::from(Utc::now().timestamp_millis()));

    let mut response = next.run(request).await;

    let elapsed = format!("{}ms", started.elapsed().as_millis());
    match HeaderValue::from_str(&elapsed) {
        Ok(value) => {
            response.headers_mut().insert(RESPONSE_TIME, value);
        }
        Err(e) => warn!("Could not set {} header: {}", RESPONSE_TIME, e),
    }
    response
}
