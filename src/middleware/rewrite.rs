//! Internal path rewrites applied before routing.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::OriginalUri;
use axum::http::uri::PathAndQuery;
use axum::http::{Request, Uri};
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::config::RewriteRule;

/// An ordered set of exact-path rewrite rules. The first matching rule wins.
#[derive(Debug, Clone, Default)]
pub struct Rewrites {
    rules: Arc<Vec<RewriteRule>>,
}

impl Rewrites {
    pub fn new(rules: Vec<RewriteRule>) -> Self {
        Rewrites {
            rules: Arc::new(rules),
        }
    }

    /// The destination path for `path`, if a rule matches it.
    pub fn resolve(&self, path: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.source == path)
            .map(|rule| rule.destination.as_str())
    }

    /// Rewrites the request URI in place, keeping its query string.
    ///
    /// The URI as received is kept in the `OriginalUri` extension.
    pub fn apply<B>(&self, request: &mut Request<B>) {
        let Some(destination) = self.resolve(request.uri().path()) else {
            return;
        };
        let target = match request.uri().query() {
            Some(query) => format!("{}?{}", destination, query),
            None => destination.to_string(),
        };

        let original = request.uri().clone();
        let mut parts = original.clone().into_parts();
        parts.path_and_query = match PathAndQuery::try_from(target) {
            Ok(path_and_query) => Some(path_and_query),
            Err(e) => {
                warn!("Invalid rewrite destination '{}': {}", destination, e);
                return;
            }
        };
        match Uri::from_parts(parts) {
            Ok(uri) => {
                debug!("Rewriting {} to {}", original, uri);
                request.extensions_mut().insert(OriginalUri(original));
                *request.uri_mut() = uri;
            }
            Err(e) => warn!("Could not rewrite {}: {}", original, e),
        }
    }
}

/// Layer applying [`Rewrites`] in front of a service, typically the whole router.
#[derive(Debug, Clone)]
pub struct RewriteLayer {
    rewrites: Rewrites,
}

impl RewriteLayer {
    pub fn new(rewrites: Rewrites) -> Self {
        RewriteLayer { rewrites }
    }
}

impl<S> Layer<S> for RewriteLayer {
    type Service = Rewrite<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Rewrite {
            inner,
            rewrites: self.rewrites.clone(),
        }
    }
}

/// Service produced by [`RewriteLayer`].
#[derive(Debug, Clone)]
pub struct Rewrite<S> {
    inner: S,
    rewrites: Rewrites,
}

impl<S, B> Service<Request<B>> for Rewrite<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<B>) -> Self::Future {
        self.rewrites.apply(&mut request);
        self.inner.call(request)
    }
}
