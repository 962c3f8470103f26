//! Database driver trait and registry
//!
//! One driver per engine family. The rotation engine resolves a driver from
//! the credential's engine field and never talks SQL itself.

use super::engine::{ConnectionParams, EngineKind};
use crate::config::DatabaseConfig;
use crate::errors::{Result, RotationError};
use crate::secrets::SecretString;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Engine-specific credential operations.
///
/// Every call opens its own connection and closes it before returning, on
/// success and failure alike. No connection outlives a call.
#[async_trait]
pub trait DatabaseDriver: Send + Sync + std::fmt::Debug {
    /// Engine family this driver serves
    fn engine(&self) -> EngineKind;

    /// Log in with `params` and run the engine's health probe.
    ///
    /// # Errors
    /// - [`RotationError::DatabaseConnectionFailed`] if the login fails or
    ///   exceeds the connect timeout
    /// - [`RotationError::DatabaseStatementFailed`] if the probe fails
    async fn check_connection(&self, params: &ConnectionParams) -> Result<()>;

    /// Log in with `params` and set `target_username`'s password to
    /// `new_password` with a single statement. The username is never changed.
    ///
    /// # Errors
    /// - [`RotationError::DatabaseConnectionFailed`] if the login fails
    /// - [`RotationError::DatabaseStatementFailed`] if the statement fails
    async fn change_password(
        &self,
        params: &ConnectionParams,
        target_username: &str,
        new_password: &SecretString,
    ) -> Result<()>;
}

/// Drivers keyed by engine family
#[derive(Default)]
pub struct DriverRegistry {
    drivers: HashMap<EngineKind, Arc<dyn DatabaseDriver>>,
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("engines", &self.registered_engines())
            .finish()
    }
}

impl DriverRegistry {
    /// Create a new registry with no drivers
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every driver compiled into this build
    pub fn from_config(config: &DatabaseConfig) -> Self {
        let mut registry = Self::new();

        registry.register(Arc::new(super::postgres::PostgresDriver::new(
            config.connect_timeout(EngineKind::Postgres),
        )));
        registry.register(Arc::new(super::mysql::MySqlDriver::new(
            config.connect_timeout(EngineKind::MySql),
        )));

        #[cfg(feature = "oracle")]
        registry.register(Arc::new(super::oracle::OracleDriver::new(
            config.connect_timeout(EngineKind::Oracle),
        )));

        registry
    }

    /// Register a driver, replacing any existing one for the same engine
    pub fn register(&mut self, driver: Arc<dyn DatabaseDriver>) {
        let engine = driver.engine();
        info!(engine = %engine, "Registering database driver");
        self.drivers.insert(engine, driver);
    }

    pub fn has_driver(&self, engine: EngineKind) -> bool {
        self.drivers.contains_key(&engine)
    }

    pub fn registered_engines(&self) -> Vec<EngineKind> {
        let mut engines: Vec<EngineKind> = self.drivers.keys().copied().collect();
        engines.sort_by_key(|engine| engine.as_str());
        engines
    }

    /// Driver for `engine`.
    ///
    /// # Errors
    /// - [`RotationError::UnsupportedEngine`] if this build has no driver for it
    pub fn driver(&self, engine: EngineKind) -> Result<Arc<dyn DatabaseDriver>> {
        self.drivers.get(&engine).cloned().ok_or_else(|| {
            RotationError::unsupported_engine(format!("{} (driver not compiled in)", engine))
        })
    }
}
