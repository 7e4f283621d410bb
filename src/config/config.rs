use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::metrics::MetricsConfig;

/// Environment variable holding the path of the configuration file.
pub const CONFIG_PATH_ENV: &str = "ROUTEMETER_CONFIG";

/// Prefix of environment variables overriding configuration keys.
/// Nested keys are separated by `__`, e.g. `ROUTEMETER_LOGGING__LEVEL=debug`.
pub const ENV_PREFIX: &str = "ROUTEMETER_";

const DEFAULT_CONFIG_PATH: &str = "./config.yaml";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    pub bind_address: String,
    /// Paths equal to or below this prefix get the request timing headers.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Internal rewrites applied before routing.
    #[serde(default = "default_rewrites")]
    pub rewrites: Vec<RewriteRule>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Routes requests for `source` to `destination` without a redirect.
/// Both are matched and substituted as exact paths; the query string is kept.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct RewriteRule {
    pub source: String,
    pub destination: String,
}

impl RewriteRule {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        RewriteRule {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_rewrites() -> Vec<RewriteRule> {
    vec![RewriteRule::new("/metrics", "/api/metrics")]
}

/// Extract a `ConfigV1` from an already assembled figment.
pub fn extract_config(figment: Figment) -> Result<ConfigV1, figment::Error> {
    match figment.extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
    // handle configuration migration between versions here when necessary
}

/// Load config from the YAML file named by `ROUTEMETER_CONFIG` (default
/// `./config.yaml`), with `ROUTEMETER_*` environment overrides on top.
pub fn load_config() -> Result<ConfigV1, figment::Error> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let figment = Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"));
    extract_config(figment)
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
