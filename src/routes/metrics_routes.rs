//! Metrics exposition endpoint.

use crate::metrics::{MetricsExporter, MetricsRecorder};
use crate::utils::http_helpers::HTTPError;
use axum::{
    extract::{FromRef, State},
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{on, MethodFilter},
    Router,
};
use tracing::error;

/// Creates the metrics route. Requests for `/metrics` reach it through the
/// default rewrite.
///
/// Only `GET` is served; `HEAD` and every other method get a 405.
pub fn routes<S, R>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    R: MetricsRecorder + MetricsExporter + FromRef<S>,
{
    Router::new().route(
        "/api/metrics",
        on(MethodFilter::GET, metrics_handler::<R>).fallback(method_not_allowed),
    )
}

/// Handler for the /api/metrics endpoint.
///
/// Returns all collected metrics in Prometheus text format.
/// This endpoint should be restricted via Ingress to prevent public access.
async fn metrics_handler<R>(State(metrics): State<R>) -> Result<impl IntoResponse, HTTPError>
where
    R: MetricsRecorder + MetricsExporter,
{
    metrics.record_http_request(Method::GET.as_str(), StatusCode::OK.as_u16());

    let metrics_text = metrics.render().map_err(|e| {
        error!("Error generating metrics: {}", e);
        HTTPError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to generate metrics",
        )
    })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, metrics.content_type())],
        metrics_text,
    ))
}

async fn method_not_allowed() -> HTTPError {
    HTTPError::method_not_allowed("GET")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsError;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    /// A registry whose encoder always fails.
    #[derive(Clone, Default)]
    struct BrokenRegistry {
        scrapes: Arc<AtomicU64>,
    }

    impl MetricsRecorder for BrokenRegistry {
        fn record_api_request(&self, _method: &str, _route: &str, _status: u16, _secs: f64) {}

        fn record_http_request(&self, _method: &str, _status: u16) {
            self.scrapes.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl MetricsExporter for BrokenRegistry {
        fn content_type(&self) -> &'static str {
            prometheus::TEXT_FORMAT
        }

        fn render(&self) -> Result<String, MetricsError> {
            Err(MetricsError::Encode(prometheus::Error::Msg(
                "encoder unavailable".to_string(),
            )))
        }
    }

    fn app(registry: BrokenRegistry) -> Router {
        routes::<BrokenRegistry, BrokenRegistry>().with_state(registry)
    }

    #[tokio::test]
    async fn render_failure_is_a_json_500() {
        let registry = BrokenRegistry::default();

        let response = app(registry.clone())
            .oneshot(
                Request::get("/api/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "Failed to generate metrics");
        assert_eq!(registry.scrapes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn head_is_not_served() {
        let registry = BrokenRegistry::default();

        let response = app(registry.clone())
            .oneshot(
                Request::head("/api/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(registry.scrapes.load(Ordering::SeqCst), 0);
    }
}
