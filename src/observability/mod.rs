//! # Observability Infrastructure
//!
//! Structured logging via `tracing` and step metrics via the `metrics`
//! facade.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, log_config_info};
pub use metrics::{describe_metrics, RotationMetrics};
