// This module re-exports the configuration pieces for convenience,
// so callers can "use crate::config::*" easily.
pub mod config;
pub mod logging;
pub mod metrics;

pub use config::*;
pub use logging::*;
pub use metrics::*;
