//! # Structured Logging
//!
//! Subscriber setup and span helpers. Password material never appears in a
//! span or event field: payloads are logged by secret id and token only.

use crate::config::{AppConfig, ObservabilityConfig};
use crate::errors::{Result, RotationError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Create a tracing span for one rotation step.
///
/// The `engine` field starts empty and is recorded once the credential has
/// been loaded:
///
/// ```rust,ignore
/// let span = rotation_span!("setSecret", "db/app", "token-1");
/// span.record("engine", "postgres");
/// ```
#[macro_export]
macro_rules! rotation_span {
    ($step:expr, $secret_id:expr, $token:expr) => {
        tracing::info_span!(
            "rotation_step",
            step = %$step,
            secret_id = %$secret_id,
            token = %$token,
            invocation_id = %uuid::Uuid::new_v4(),
            engine = tracing::field::Empty
        )
    };
    ($step:expr, $secret_id:expr, $token:expr, $($field:tt)*) => {
        tracing::info_span!(
            "rotation_step",
            step = %$step,
            secret_id = %$secret_id,
            token = %$token,
            invocation_id = %uuid::Uuid::new_v4(),
            engine = tracing::field::Empty,
            $($field)*
        )
    };
}

/// Install the global subscriber. Logs go to stderr so stdout stays free for
/// command output.
///
/// `RUST_LOG` takes precedence over the configured level; `verbose` lowers the
/// configured level to `debug`. A subscriber installed earlier (tests, an
/// embedding host) is left in place.
pub fn init_logging(config: &ObservabilityConfig, verbose: bool) -> Result<()> {
    let filter = build_filter(config, verbose)?;
    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json_logging {
        registry
            .with(fmt::layer().json().with_current_span(true).with_writer(std::io::stderr))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(false).with_writer(std::io::stderr)).try_init()
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "Global subscriber already installed");
    }
    Ok(())
}

fn build_filter(config: &ObservabilityConfig, verbose: bool) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let default_level = if verbose { "debug" } else { config.log_level.as_str() };
    EnvFilter::try_new(default_level).map_err(|e| {
        RotationError::config_with_source(
            format!("Invalid log level '{}'", default_level),
            Box::new(e),
        )
    })
}

/// Log configuration at startup
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        service_name = %config.observability.service_name,
        password_length = config.password.length,
        password_complexity = %config.password.complexity,
        connect_timeout_seconds = config.database.connect_timeout_seconds,
        max_retries = config.max_retries,
        aws_region = ?config.store.aws_region,
        "Secret rotator configuration"
    );
}
