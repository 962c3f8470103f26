//! MySQL / MariaDB driver

use super::dialect;
use super::driver::DatabaseDriver;
use super::engine::{ConnectionParams, EngineKind};
use super::sqlx_support;
use crate::errors::Result;
use crate::secrets::SecretString;
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::ConnectOptions;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Rotates MySQL and MariaDB account passwords with `ALTER USER`
#[derive(Debug, Clone)]
pub struct MySqlDriver {
    timeout: Duration,
}

impl MySqlDriver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn connect_options(params: &ConnectionParams) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .username(&params.username)
            .password(params.password.expose_secret());
        if let Some(database) = &params.database {
            options = options.database(database);
        }
        options.disable_statement_logging()
    }

    async fn connect(&self, params: &ConnectionParams) -> Result<MySqlConnection> {
        let options = Self::connect_options(params);
        sqlx_support::connect::<MySqlConnection>(&options, params, self.timeout).await
    }
}

#[async_trait]
impl DatabaseDriver for MySqlDriver {
    fn engine(&self) -> EngineKind {
        EngineKind::MySql
    }

    #[instrument(skip(self, params), fields(endpoint = %params.endpoint(), username = %params.username))]
    async fn check_connection(&self, params: &ConnectionParams) -> Result<()> {
        let mut conn = self.connect(params).await?;
        let probe = dialect::probe_statement(EngineKind::MySql);
        let result = sqlx_support::run_statement(
            params,
            "health probe",
            self.timeout,
            sqlx::Executor::execute(&mut conn, sqlx::raw_sql(probe)),
        )
        .await;
        sqlx_support::close(conn, params).await;

        result.map(|_| debug!("MySQL login succeeded"))
    }

    #[instrument(skip(self, params, new_password), fields(endpoint = %params.endpoint(), target = %target_username))]
    async fn change_password(
        &self,
        params: &ConnectionParams,
        target_username: &str,
        new_password: &SecretString,
    ) -> Result<()> {
        let statement = dialect::mysql_alter_user(
            &params.username,
            target_username,
            new_password.expose_secret(),
        )?;
        let mut conn = self.connect(params).await?;
        let result = sqlx_support::run_statement(
            params,
            "ALTER USER",
            self.timeout,
            sqlx::Executor::execute(&mut conn, sqlx::raw_sql(&statement)),
        )
        .await;
        sqlx_support::close(conn, params).await;

        result?;
        info!("MySQL password changed");
        Ok(())
    }
}
