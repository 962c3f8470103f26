//! Credential record stored under each secret version.
//!
//! Stored as a JSON object:
//!
//! ```json
//! {
//!   "engine": "postgres",
//!   "host": "db1.internal",
//!   "port": 5432,
//!   "username": "app",
//!   "password": "<secret>",
//!   "dbname": "app"
//! }
//! ```
//!
//! `port` may also be a numeric string. Unknown keys are kept as-is so that a
//! derived version differs from its parent only in `password`.

use super::types::{serialize_exposed, SecretString};
use crate::database::{ConnectionParams, EngineKind};
use crate::errors::{Result, RotationError};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretPayload {
    /// Raw engine name; validated where the protocol dispatches on it
    pub engine: String,
    pub host: String,
    #[serde(default, deserialize_with = "deserialize_port", skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub username: String,
    #[serde(serialize_with = "serialize_exposed")]
    pub password: SecretString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dbname: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortRepr {
    Number(u16),
    Text(String),
}

fn deserialize_port<'de, D>(deserializer: D) -> std::result::Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<PortRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(PortRepr::Number(port)) => Ok(Some(port)),
        Some(PortRepr::Text(text)) => text
            .trim()
            .parse::<u16>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid port '{}'", text))),
    }
}

impl SecretPayload {
    /// Parse a stored secret string.
    ///
    /// The serde error is not attached as a source; it can quote the input,
    /// password included.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| {
            RotationError::payload(format!(
                "stored secret is not a credential record (line {}, column {})",
                e.line(),
                e.column()
            ))
        })
    }

    /// Serialize for storage, password included.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Copy of this payload with only the password replaced.
    pub fn with_password(&self, password: SecretString) -> Self {
        Self { password, ..self.clone() }
    }

    pub fn engine_kind(&self) -> Result<EngineKind> {
        self.engine.parse()
    }

    /// Connection parameters for this credential, resolving the default port.
    pub fn connection_params(&self) -> Result<ConnectionParams> {
        let engine = self.engine_kind()?;
        Ok(ConnectionParams {
            engine,
            host: self.host.clone(),
            port: self.port.unwrap_or_else(|| engine.default_port()),
            username: self.username.clone(),
            password: self.password.clone(),
            database: self.dbname.clone(),
        })
    }
}
