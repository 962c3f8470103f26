//! # Configuration Management
//!
//! Layered configuration: built-in defaults, then an optional TOML file, then
//! `ROTATOR_`-prefixed environment variables. Nested keys use a double
//! underscore, e.g. `ROTATOR_PASSWORD__LENGTH=48` or
//! `ROTATOR_DATABASE__CONNECT_TIMEOUT_SECONDS=10`.

pub mod settings;

pub use settings::{AppConfig, DatabaseConfig, ObservabilityConfig, StoreConfig};

use crate::errors::Result;
use std::path::Path;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "ROTATOR";

impl AppConfig {
    /// Load and validate configuration.
    ///
    /// `path` is optional; a missing file is an error only when a path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration from defaults and environment variables only
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }
}
