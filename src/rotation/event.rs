//! Coordinator invocation payload.

use super::step::RotationStep;
use crate::errors::{Result, RotationError};
use serde::{Deserialize, Serialize};

/// `{"SecretId": ..., "ClientRequestToken": ..., "Step": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RotationEvent {
    pub secret_id: String,
    pub client_request_token: String,
    pub step: RotationStep,
}

impl RotationEvent {
    pub fn new(
        secret_id: impl Into<String>,
        client_request_token: impl Into<String>,
        step: RotationStep,
    ) -> Self {
        Self {
            secret_id: secret_id.into(),
            client_request_token: client_request_token.into(),
            step,
        }
    }

    /// Parse an event; unknown keys (e.g. `RotationToken`) are ignored.
    pub fn from_json(raw: &str) -> Result<Self> {
        let event: Self = serde_json::from_str(raw).map_err(|e| {
            RotationError::Payload {
                context: "rotation event is not a {SecretId, ClientRequestToken, Step} object"
                    .to_string(),
                source: Some(e),
            }
        })?;

        if event.secret_id.trim().is_empty() || event.client_request_token.trim().is_empty() {
            return Err(RotationError::payload(
                "rotation event has an empty SecretId or ClientRequestToken",
            ));
        }
        Ok(event)
    }
}
