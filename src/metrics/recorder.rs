//! Metrics recording implementation using Prometheus.

use prometheus::core::{Collector, MetricVec, MetricVecBuilder};
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::MetricsConfig;
use crate::utils::log_throttle::should_emit;

/// How often a recurring label failure for the same metric is logged.
const LABEL_WARNING_INTERVAL: Duration = Duration::from_secs(60);

/// Errors raised while building or rendering the metrics registry.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("histogram buckets must be finite and strictly increasing: {0:?}")]
    InvalidBuckets(Vec<f64>),
    #[error("invalid metric namespace '{0}': expected [a-zA-Z_:][a-zA-Z0-9_:]*")]
    InvalidNamespace(String),
    #[error("failed to register metric: {0}")]
    Registration(#[source] prometheus::Error),
    #[error("failed to encode metrics: {0}")]
    Encode(#[source] prometheus::Error),
    #[error("metrics encoding produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Trait for recording request metrics.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Records one completed API request: a counter increment plus a latency sample.
    fn record_api_request(&self, method: &str, route: &str, status: u16, duration_secs: f64);

    /// Records a request served by the metrics endpoint itself.
    fn record_http_request(&self, method: &str, status: u16);
}

/// Trait for serving the collected metrics to a scraper.
pub trait MetricsExporter: Clone + Send + Sync + 'static {
    /// The content type of the rendered output.
    fn content_type(&self) -> &'static str;

    /// Renders every metric in the exposition format.
    fn render(&self) -> Result<String, MetricsError>;
}

/// Prometheus metrics collector.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    // API route metrics
    api_requests_total: CounterVec,
    api_request_duration_seconds: HistogramVec,

    // Scrape metrics
    http_requests_total: CounterVec,
}

impl Metrics {
    /// Creates a new metrics instance backed by its own registry.
    ///
    /// The registry is private to this instance, so several instances (one per
    /// test, for example) never clash over metric names.
    pub fn new(config: &MetricsConfig) -> Result<Self, MetricsError> {
        let const_labels = if config.const_labels.is_empty() {
            None
        } else {
            Some(config.const_labels.clone())
        };
        let registry = Arc::new(
            Registry::new_custom(None, const_labels).map_err(MetricsError::Registration)?,
        );

        let api_requests_total = register(
            &registry,
            CounterVec::new(
                Opts::new("api_requests_total", "Total number of API requests"),
                &["method", "route", "status"],
            ),
        )?;

        validate_buckets(&config.duration_buckets)?;
        let api_request_duration_seconds = register(
            &registry,
            HistogramVec::new(
                HistogramOpts::new(
                    "api_request_duration_seconds",
                    "API request duration in seconds",
                )
                .buckets(config.duration_buckets.clone()),
                &["method", "route", "status"],
            ),
        )?;

        let http_requests_total = register(
            &registry,
            CounterVec::new(
                Opts::new("http_requests_total", "Total HTTP requests"),
                &["method", "status"],
            ),
        )?;

        if config.process_metrics {
            validate_namespace(&config.process_namespace)?;
            register_process_collector(&registry, &config.process_namespace)?;
        }

        Ok(Metrics {
            registry,
            api_requests_total,
            api_request_duration_seconds,
            http_requests_total,
        })
    }

    /// The content type of the output produced by [`Metrics::render`].
    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }

    /// Renders all metrics in Prometheus text format.
    pub fn render(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(MetricsError::Encode)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Registers a freshly built collector and hands it back.
fn register<C>(registry: &Registry, collector: prometheus::Result<C>) -> Result<C, MetricsError>
where
    C: Collector + Clone + 'static,
{
    let collector = collector.map_err(MetricsError::Registration)?;
    registry
        .register(Box::new(collector.clone()))
        .map_err(MetricsError::Registration)?;
    Ok(collector)
}

// Prometheus only checks buckets when the first labelled child is created,
// which would panic on the request path.
fn validate_buckets(buckets: &[f64]) -> Result<(), MetricsError> {
    let finite = buckets.iter().all(|b| b.is_finite());
    let increasing = buckets.windows(2).all(|pair| pair[0] < pair[1]);
    if buckets.is_empty() || !finite || !increasing {
        return Err(MetricsError::InvalidBuckets(buckets.to_vec()));
    }
    Ok(())
}

// `ProcessCollector::new` unwraps the descriptors it builds from the namespace.
fn validate_namespace(namespace: &str) -> Result<(), MetricsError> {
    let mut chars = namespace.chars();
    let valid = match chars.next() {
        None => true,
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_' || first == ':')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
        }
    };
    if !valid {
        return Err(MetricsError::InvalidNamespace(namespace.to_string()));
    }
    Ok(())
}

/// Looks up the child of `vec` for `labels`.
///
/// A failed lookup is logged at most once per interval and the observation
/// is dropped; recording never fails the request.
fn labelled<B: MetricVecBuilder>(
    vec: &MetricVec<B>,
    name: &str,
    labels: &[&str],
) -> Option<B::M> {
    match vec.get_metric_with_label_values(labels) {
        Ok(metric) => Some(metric),
        Err(e) => {
            let key = format!("metrics.labels.{}", name);
            if let Some(suppressed) = should_emit(&key, LABEL_WARNING_INTERVAL) {
                warn!(
                    metric = name,
                    suppressed, "Dropping observation with unusable labels: {}", e
                );
            }
            None
        }
    }
}

#[cfg(target_os = "linux")]
fn register_process_collector(registry: &Registry, namespace: &str) -> Result<(), MetricsError> {
    use prometheus::process_collector::ProcessCollector;

    let collector = ProcessCollector::new(std::process::id() as i32, namespace.to_string());
    registry
        .register(Box::new(collector))
        .map_err(MetricsError::Registration)
}

#[cfg(not(target_os = "linux"))]
fn register_process_collector(_registry: &Registry, _namespace: &str) -> Result<(), MetricsError> {
    debug!("Process metrics are only collected on Linux; skipping.");
    Ok(())
}

impl MetricsRecorder for Metrics {
    fn record_api_request(&self, method: &str, route: &str, status: u16, duration_secs: f64) {
        let status = status.to_string();
        let labels = [method, route, status.as_str()];

        if let Some(counter) = labelled(&self.api_requests_total, "api_requests_total", &labels) {
            counter.inc();
        }
        if let Some(histogram) = labelled(
            &self.api_request_duration_seconds,
            "api_request_duration_seconds",
            &labels,
        ) {
            histogram.observe(duration_secs);
        }

        debug!(
            method,
            route,
            status = status.as_str(),
            duration_secs,
            "Recorded API request"
        );
    }

    fn record_http_request(&self, method: &str, status: u16) {
        let status = status.to_string();
        if let Some(counter) = labelled(
            &self.http_requests_total,
            "http_requests_total",
            &[method, status.as_str()],
        ) {
            counter.inc();
        }
    }
}

impl MetricsExporter for Metrics {
    fn content_type(&self) -> &'static str {
        Metrics::content_type(self)
    }

    fn render(&self) -> Result<String, MetricsError> {
        Metrics::render(self)
    }
}
