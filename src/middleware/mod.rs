//! Request-path middleware: internal rewrites, API timing headers and the
//! per-route metrics wrapper.

pub mod instrument;
pub mod rewrite;
pub mod timing;

pub use instrument::{route_label, InstrumentLayer, Instrumented};
pub use rewrite::{Rewrite, RewriteLayer, Rewrites};
pub use timing::{is_under_prefix, request_timing, REQUEST_START, RESPONSE_TIME};
