//! Supported database engines and the parameters needed to reach them.

use crate::errors::{Result, RotationError};
use crate::secrets::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Database engine family a credential belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Postgres,
    /// MySQL and MariaDB share a wire protocol and dialect
    MySql,
    Oracle,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Oracle => "oracle",
        }
    }

    /// Port used when the stored payload does not carry one
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Postgres => 5432,
            Self::MySql => 3306,
            Self::Oracle => 1521,
        }
    }
}

impl FromStr for EngineKind {
    type Err = RotationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "oracle" => Ok(Self::Oracle),
            _ => Err(RotationError::unsupported_engine(s)),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything a driver needs to open one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub engine: EngineKind,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// Database name (postgres, mysql) or service name (oracle)
    pub database: Option<String>,
}

impl ConnectionParams {
    /// `host:port`, for logs and error messages
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
