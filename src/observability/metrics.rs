//! # Rotation Metrics
//!
//! Step counters and latency histograms recorded through the `metrics`
//! facade. Without an installed recorder every call is a no-op; embedding
//! hosts install their own exporter.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::sync::Once;
use std::time::Duration;

static DESCRIBE: Once = Once::new();

/// Register metric descriptions with the installed recorder
pub fn describe_metrics() {
    DESCRIBE.call_once(|| {
        describe_counter!(
            "rotation_steps_total",
            Unit::Count,
            "Rotation step invocations by step and outcome"
        );
        describe_histogram!(
            "rotation_step_duration_seconds",
            Unit::Seconds,
            "Wall-clock duration of rotation steps"
        );
        describe_counter!(
            "rotation_password_changes_total",
            Unit::Count,
            "Password changes applied to target databases by engine"
        );
    });
}

/// Records rotation outcomes
#[derive(Debug, Clone, Default)]
pub struct RotationMetrics;

impl RotationMetrics {
    pub fn new() -> Self {
        describe_metrics();
        Self
    }

    /// Record a finished step. `outcome` is `success` or an error kind.
    pub fn record_step(&self, step: &str, outcome: &str, duration: Duration) {
        let labels = [("step", step.to_string()), ("outcome", outcome.to_string())];
        counter!("rotation_steps_total", &labels).increment(1);

        let duration_labels = [("step", step.to_string())];
        histogram!("rotation_step_duration_seconds", &duration_labels)
            .record(duration.as_secs_f64());
    }

    /// Record a password change applied by setSecret
    pub fn record_password_change(&self, engine: &str) {
        let labels = [("engine", engine.to_string())];
        counter!("rotation_password_changes_total", &labels).increment(1);
    }
}
