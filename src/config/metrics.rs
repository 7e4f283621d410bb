use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Upper bounds (seconds) of the API latency histogram buckets.
pub const DEFAULT_DURATION_BUCKETS: [f64; 9] = [0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0];

/// Settings for the metrics registry.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct MetricsConfig {
    /// Histogram buckets for `api_request_duration_seconds`, strictly increasing.
    #[serde(default = "default_duration_buckets")]
    pub duration_buckets: Vec<f64>,
    /// Labels attached to every exported series (e.g. `service`, `env`).
    #[serde(default)]
    pub const_labels: HashMap<String, String>,
    /// Export CPU/memory/fd metrics of the running process.
    #[serde(default = "default_process_metrics")]
    pub process_metrics: bool,
    /// Optional namespace prepended to the process metric names.
    #[serde(default)]
    pub process_namespace: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            duration_buckets: default_duration_buckets(),
            const_labels: HashMap::new(),
            process_metrics: default_process_metrics(),
            process_namespace: String::new(),
        }
    }
}

fn default_duration_buckets() -> Vec<f64> {
    DEFAULT_DURATION_BUCKETS.to_vec()
}

fn default_process_metrics() -> bool {
    true
}
