//! Per-request metrics for wrapped routes.
//!
//! [`InstrumentLayer`] records exactly one observation (request counter plus
//! latency sample) for every request that reaches the wrapped service:
//!
//! - a response is recorded with its status code;
//! - an error from the inner service is recorded as `500` and returned as is;
//! - a panic in the inner service is recorded as `500` and then resumed.

use std::panic::AssertUnwindSafe;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::extract::MatchedPath;
use axum::http::{Request, Response, StatusCode};
use futures::future::BoxFuture;
use futures::FutureExt;
use tower::{Layer, Service};

use crate::metrics::MetricsRecorder;

/// Layer that wraps a service with [`Instrumented`].
///
/// Use it with `Router::route_layer` so the matched route template is known
/// when the request is labelled.
#[derive(Clone)]
pub struct InstrumentLayer<M> {
    recorder: M,
}

impl<M> InstrumentLayer<M> {
    pub fn new(recorder: M) -> Self {
        InstrumentLayer { recorder }
    }
}

impl<S, M: Clone> Layer<S> for InstrumentLayer<M> {
    type Service = Instrumented<S, M>;

    fn layer(&self, inner: S) -> Self::Service {
        Instrumented {
            inner,
            recorder: self.recorder.clone(),
        }
    }
}

/// Service produced by [`InstrumentLayer`].
#[derive(Clone)]
pub struct Instrumented<S, M> {
    inner: S,
    recorder: M,
}

impl<S, M, B, ResBody> Service<Request<B>> for Instrumented<S, M>
where
    S: Service<Request<B>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: 'static,
    M: MetricsRecorder,
    B: 'static,
    ResBody: 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        let observation = Observation::begin(self.recorder.clone(), &request);
        let future = self.inner.call(request);

        async move {
            match AssertUnwindSafe(future).catch_unwind().await {
                Ok(Ok(response)) => {
                    observation.finish(response.status());
                    Ok(response)
                }
                Ok(Err(err)) => {
                    observation.finish(StatusCode::INTERNAL_SERVER_ERROR);
                    Err(err)
                }
                Err(panic) => {
                    observation.finish(StatusCode::INTERNAL_SERVER_ERROR);
                    std::panic::resume_unwind(panic)
                }
            }
        }
        .boxed()
    }
}

/// A request in flight. Finishing consumes it, so each request is recorded once.
struct Observation<M> {
    recorder: M,
    method: String,
    route: String,
    started: Instant,
}

impl<M: MetricsRecorder> Observation<M> {
    fn begin<B>(recorder: M, request: &Request<B>) -> Self {
        Observation {
            recorder,
            method: request.method().as_str().to_string(),
            route: route_label(request),
            started: Instant::now(),
        }
    }

    fn finish(self, status: StatusCode) {
        let duration_secs = self.started.elapsed().as_secs_f64();
        self.recorder
            .record_api_request(&self.method, &self.route, status.as_u16(), duration_secs);
    }
}

/// The `route` label for a request: the matched route template when the
/// router provides one, otherwise the request path without its query.
pub fn route_label<B>(request: &Request<B>) -> String {
    match request.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_string(),
        None => request.uri().path().to_string(),
    }
}
