//! Prometheus metrics and structured logging for the order watcher.
//!
//! - Structured logging with tracing (JSON in production)
//! - Prometheus counters for watch outcomes, exit orders, requeues and
//!   swallowed errors

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
