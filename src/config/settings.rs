//! # Configuration Settings
//!
//! Defines the configuration structure for the rotation engine and CLI.

use crate::database::EngineKind;
use crate::errors::{Result, RotationError};
use crate::password::PasswordPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    /// Shape of generated passwords
    #[validate(nested)]
    pub password: PasswordPolicy,

    /// Target database connection settings
    #[validate(nested)]
    pub database: DatabaseConfig,

    /// Secret store settings
    #[validate(nested)]
    pub store: StoreConfig,

    /// Logging configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,

    /// Attempts a coordinator makes per step before giving up. Only used to
    /// classify the CLI exit status; the engine never loops.
    #[validate(range(min = 1, max = 100, message = "Max retries must be between 1 and 100"))]
    pub max_retries: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            password: PasswordPolicy::default(),
            database: DatabaseConfig::default(),
            store: StoreConfig::default(),
            observability: ObservabilityConfig::default(),
            max_retries: 3,
        }
    }
}

impl AppConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(RotationError::from)?;
        self.validate_custom()
    }

    /// Checks the validator derive cannot express
    fn validate_custom(&self) -> Result<()> {
        // Fails if an exclusion empties a class or the length is too short
        self.password.effective_classes()?;

        if let Some(endpoint) = &self.store.endpoint_url {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(RotationError::config(
                    "Store endpoint URL must start with 'http://' or 'https://'",
                ));
            }
        }

        Ok(())
    }
}

/// Target database connection settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection timeout in seconds, for engines without an override
    #[validate(range(min = 1, max = 300, message = "Connect timeout must be between 1 and 300 seconds"))]
    pub connect_timeout_seconds: u64,

    #[validate(range(min = 1, max = 300, message = "Connect timeout must be between 1 and 300 seconds"))]
    pub postgres_connect_timeout_seconds: Option<u64>,

    #[validate(range(min = 1, max = 300, message = "Connect timeout must be between 1 and 300 seconds"))]
    pub mysql_connect_timeout_seconds: Option<u64>,

    #[validate(range(min = 1, max = 300, message = "Connect timeout must be between 1 and 300 seconds"))]
    pub oracle_connect_timeout_seconds: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            connect_timeout_seconds: 30,
            postgres_connect_timeout_seconds: None,
            mysql_connect_timeout_seconds: None,
            oracle_connect_timeout_seconds: None,
        }
    }
}

impl DatabaseConfig {
    /// Get the connection timeout for `engine` as Duration
    pub fn connect_timeout(&self, engine: EngineKind) -> Duration {
        let seconds = match engine {
            EngineKind::Postgres => self.postgres_connect_timeout_seconds,
            EngineKind::MySql => self.mysql_connect_timeout_seconds,
            EngineKind::Oracle => self.oracle_connect_timeout_seconds,
        };
        Duration::from_secs(seconds.unwrap_or(self.connect_timeout_seconds))
    }
}

/// AWS Secrets Manager client settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// Region; resolved from the SDK environment when unset
    #[validate(length(min = 1, message = "AWS region cannot be empty"))]
    pub aws_region: Option<String>,

    /// Endpoint override (LocalStack, VPC endpoints)
    pub endpoint_url: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Service name attached to log output
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "secret-rotator".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}
