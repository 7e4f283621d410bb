//! Metrics collection and exposition for Prometheus.
//!
//! This module owns the registry of API request metrics and renders it
//! in the text exposition format.

mod recorder;

pub use recorder::{Metrics, MetricsError, MetricsExporter, MetricsRecorder};
