//! Oracle driver
//!
//! The `oracle` crate wraps the blocking ODPI-C client, so every call runs on
//! tokio's blocking pool.

use super::dialect;
use super::driver::DatabaseDriver;
use super::engine::{ConnectionParams, EngineKind};
use crate::errors::{Result, RotationError};
use crate::secrets::SecretString;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Default service name when the payload has no `dbname`
const DEFAULT_SERVICE: &str = "ORCL";

/// Rotates Oracle user passwords with `ALTER USER ... IDENTIFIED BY`
#[derive(Debug, Clone)]
pub struct OracleDriver {
    timeout: Duration,
}

impl OracleDriver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// EZConnect string: `//host:port/service`
    fn connect_string(params: &ConnectionParams) -> String {
        format!(
            "//{}:{}/{}",
            params.host,
            params.port,
            params.database.as_deref().unwrap_or(DEFAULT_SERVICE)
        )
    }

    /// Connect, run `statement`, close. Runs on the blocking pool.
    ///
    /// Login and statement each get `timeout`. After login the call timeout
    /// is handed to ODPI-C so a hung statement is cancelled by the client
    /// rather than left running on the blocking thread.
    async fn run(&self, params: &ConnectionParams, statement: String, what: &'static str) -> Result<()> {
        let connect_string = Self::connect_string(params);
        let username = params.username.clone();
        let password = params.password.clone();
        let endpoint = params.endpoint();
        let is_query = statement.trim_start().to_ascii_uppercase().starts_with("SELECT");
        let call_timeout = self.timeout;
        let logged_in = Arc::new(AtomicBool::new(false));
        let worker_logged_in = Arc::clone(&logged_in);

        let task = tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = oracle::Connection::connect(&username, password.expose_secret(), &connect_string)
                .map_err(|e| {
                    RotationError::connection_failed_with_source(
                        EngineKind::Oracle.as_str(),
                        endpoint.clone(),
                        format!("login as '{}' failed", username),
                        Box::new(e),
                    )
                })?;
            worker_logged_in.store(true, Ordering::SeqCst);

            if let Err(e) = conn.set_call_timeout(Some(call_timeout)) {
                warn!(endpoint = %endpoint, error = %e, "Failed to set Oracle call timeout");
            }

            let outcome = if is_query {
                conn.query_row(&statement, &[]).map(|_| ())
            } else {
                conn.execute(&statement, &[]).map(|_| ())
            };

            if let Err(e) = conn.close() {
                warn!(endpoint = %endpoint, error = %e, "Failed to close Oracle connection cleanly");
            }

            outcome.map_err(|e| {
                RotationError::statement_failed_with_source(
                    EngineKind::Oracle.as_str(),
                    format!("{} failed", what),
                    Box::new(e),
                )
            })
        });

        match tokio::time::timeout(self.timeout * 2, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(RotationError::internal(format!(
                "Oracle worker task failed: {}",
                join_error
            ))),
            Err(_) => Err(timeout_error(params, what, self.timeout, logged_in.load(Ordering::SeqCst))),
        }
    }
}

/// A timeout before login is a connection failure; after login the statement
/// may or may not have been applied.
fn timeout_error(
    params: &ConnectionParams,
    what: &str,
    timeout: Duration,
    logged_in: bool,
) -> RotationError {
    if logged_in {
        RotationError::statement_failed(
            EngineKind::Oracle.as_str(),
            format!("{} timed out after {}s; outcome unknown", what, timeout.as_secs()),
        )
    } else {
        RotationError::connection_failed(
            EngineKind::Oracle.as_str(),
            params.endpoint(),
            format!("connect timed out after {}s", timeout.as_secs()),
        )
    }
}

#[async_trait]
impl DatabaseDriver for OracleDriver {
    fn engine(&self) -> EngineKind {
        EngineKind::Oracle
    }

    #[instrument(skip(self, params), fields(endpoint = %params.endpoint(), username = %params.username))]
    async fn check_connection(&self, params: &ConnectionParams) -> Result<()> {
        let probe = dialect::probe_statement(EngineKind::Oracle).to_string();
        self.run(params, probe, "health probe").await?;
        debug!("Oracle login succeeded");
        Ok(())
    }

    #[instrument(skip(self, params, new_password), fields(endpoint = %params.endpoint(), target = %target_username))]
    async fn change_password(
        &self,
        params: &ConnectionParams,
        target_username: &str,
        new_password: &SecretString,
    ) -> Result<()> {
        let statement = dialect::oracle_alter_user(target_username, new_password.expose_secret())?;
        self.run(params, statement, "ALTER USER").await?;
        info!("Oracle password changed");
        Ok(())
    }
}
