//! Connection helpers shared by the sqlx-backed drivers.

use super::engine::ConnectionParams;
use crate::errors::{Result, RotationError};
use sqlx::Connection;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Open one connection, bounded by `timeout`.
pub(crate) async fn connect<C>(
    options: &C::Options,
    params: &ConnectionParams,
    timeout: Duration,
) -> Result<C>
where
    C: Connection,
{
    match tokio::time::timeout(timeout, C::connect_with(options)).await {
        Ok(Ok(connection)) => Ok(connection),
        Ok(Err(e)) => Err(RotationError::connection_failed_with_source(
            params.engine.as_str(),
            params.endpoint(),
            format!("login as '{}' failed", params.username),
            Box::new(e),
        )),
        Err(_) => Err(RotationError::connection_failed(
            params.engine.as_str(),
            params.endpoint(),
            format!("connect timed out after {}s", timeout.as_secs()),
        )),
    }
}

/// Run a statement future, bounded by `timeout`.
pub(crate) async fn run_statement<T, F>(
    params: &ConnectionParams,
    what: &str,
    timeout: Duration,
    statement: F,
) -> Result<T>
where
    F: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(timeout, statement).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(RotationError::statement_failed_with_source(
            params.engine.as_str(),
            format!("{} failed", what),
            Box::new(e),
        )),
        Err(_) => Err(RotationError::statement_failed(
            params.engine.as_str(),
            format!("{} timed out after {}s; outcome unknown", what, timeout.as_secs()),
        )),
    }
}

/// Close gracefully; a failed close only loses the goodbye message.
pub(crate) async fn close<C>(connection: C, params: &ConnectionParams)
where
    C: Connection,
{
    if let Err(e) = connection.close().await {
        warn!(
            engine = %params.engine,
            endpoint = %params.endpoint(),
            error = %e,
            "Failed to close database connection cleanly"
        );
    }
}

