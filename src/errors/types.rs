//! # Error Types
//!
//! Error taxonomy for the rotation protocol using `thiserror`.
//!
//! Every variant carries enough context for the rotation coordinator (or an
//! operator reading logs) to decide whether re-invoking the same step with the
//! same token is worthwhile. Messages never include password material.

use std::fmt;

/// Custom result type for rotation operations
pub type Result<T> = std::result::Result<T, RotationError>;

/// Main error type for the rotation engine
#[derive(thiserror::Error, Debug)]
pub enum RotationError {
    /// Rotation disabled, or the token/stage combination does not allow the step
    #[error("Invalid rotation state for secret '{secret_id}': {reason}")]
    InvalidRotationState { secret_id: String, reason: String },

    /// The payload names an engine outside the supported set (or one not compiled in)
    #[error("Unsupported database engine: {engine}")]
    UnsupportedEngine { engine: String },

    /// Could not open a connection to the target database
    #[error("Database connection failed for {engine} at {endpoint}: {message}")]
    DatabaseConnectionFailed {
        engine: String,
        endpoint: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Connected, but the statement was rejected or failed
    #[error("Database statement failed for {engine}: {message}")]
    DatabaseStatementFailed {
        engine: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Pending credentials could not establish a working connection
    #[error("Pending credentials failed validation for secret '{secret_id}': {reason}")]
    CredentialValidationFailed { secret_id: String, reason: String },

    /// finishSecret observed a label layout it did not expect
    #[error("Stage transition conflict on secret '{secret_id}': {reason}")]
    StageTransitionConflict { secret_id: String, reason: String },

    /// The addressed secret does not exist in the store
    #[error("Secret not found: {secret_id}")]
    SecretNotFound { secret_id: String },

    /// Secret store request failed
    #[error("Secret store error during {operation}: {message}")]
    SecretStore { operation: String, message: String },

    /// Stored payload is not a valid credential record
    #[error("Invalid secret payload: {context}")]
    Payload {
        context: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Coarse classification used for metrics labels and exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRotationState,
    UnsupportedEngine,
    DatabaseConnectionFailed,
    DatabaseStatementFailed,
    CredentialValidationFailed,
    StageTransitionConflict,
    SecretNotFound,
    SecretStore,
    Payload,
    Config,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRotationState => "invalid_rotation_state",
            ErrorKind::UnsupportedEngine => "unsupported_engine",
            ErrorKind::DatabaseConnectionFailed => "database_connection_failed",
            ErrorKind::DatabaseStatementFailed => "database_statement_failed",
            ErrorKind::CredentialValidationFailed => "credential_validation_failed",
            ErrorKind::StageTransitionConflict => "stage_transition_conflict",
            ErrorKind::SecretNotFound => "secret_not_found",
            ErrorKind::SecretStore => "secret_store",
            ErrorKind::Payload => "payload",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RotationError {
    /// Create an invalid rotation state error
    pub fn invalid_state<S: Into<String>, R: Into<String>>(secret_id: S, reason: R) -> Self {
        Self::InvalidRotationState { secret_id: secret_id.into(), reason: reason.into() }
    }

    /// Create an unsupported engine error
    pub fn unsupported_engine<S: Into<String>>(engine: S) -> Self {
        Self::UnsupportedEngine { engine: engine.into() }
    }

    /// Create a connection failure without an underlying source
    pub fn connection_failed<E, P, M>(engine: E, endpoint: P, message: M) -> Self
    where
        E: Into<String>,
        P: Into<String>,
        M: Into<String>,
    {
        Self::DatabaseConnectionFailed {
            engine: engine.into(),
            endpoint: endpoint.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failure wrapping the driver error
    pub fn connection_failed_with_source<E, P, M>(
        engine: E,
        endpoint: P,
        message: M,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self
    where
        E: Into<String>,
        P: Into<String>,
        M: Into<String>,
    {
        Self::DatabaseConnectionFailed {
            engine: engine.into(),
            endpoint: endpoint.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a statement failure without an underlying source
    pub fn statement_failed<E: Into<String>, M: Into<String>>(engine: E, message: M) -> Self {
        Self::DatabaseStatementFailed { engine: engine.into(), message: message.into(), source: None }
    }

    /// Create a statement failure wrapping the driver error
    pub fn statement_failed_with_source<E: Into<String>, M: Into<String>>(
        engine: E,
        message: M,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::DatabaseStatementFailed {
            engine: engine.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a credential validation error
    pub fn validation_failed<S: Into<String>, R: Into<String>>(secret_id: S, reason: R) -> Self {
        Self::CredentialValidationFailed { secret_id: secret_id.into(), reason: reason.into() }
    }

    /// Create a stage transition conflict
    pub fn stage_conflict<S: Into<String>, R: Into<String>>(secret_id: S, reason: R) -> Self {
        Self::StageTransitionConflict { secret_id: secret_id.into(), reason: reason.into() }
    }

    /// Create a secret not found error
    pub fn secret_not_found<S: Into<String>>(secret_id: S) -> Self {
        Self::SecretNotFound { secret_id: secret_id.into() }
    }

    /// Create a secret store error
    pub fn store<O: Into<String>, M: Into<String>>(operation: O, message: M) -> Self {
        Self::SecretStore { operation: operation.into(), message: message.into() }
    }

    /// Create a payload error
    pub fn payload<S: Into<String>>(context: S) -> Self {
        Self::Payload { context: context.into(), source: None }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RotationError::InvalidRotationState { .. } => ErrorKind::InvalidRotationState,
            RotationError::UnsupportedEngine { .. } => ErrorKind::UnsupportedEngine,
            RotationError::DatabaseConnectionFailed { .. } => ErrorKind::DatabaseConnectionFailed,
            RotationError::DatabaseStatementFailed { .. } => ErrorKind::DatabaseStatementFailed,
            RotationError::CredentialValidationFailed { .. } => {
                ErrorKind::CredentialValidationFailed
            }
            RotationError::StageTransitionConflict { .. } => ErrorKind::StageTransitionConflict,
            RotationError::SecretNotFound { .. } => ErrorKind::SecretNotFound,
            RotationError::SecretStore { .. } => ErrorKind::SecretStore,
            RotationError::Payload { .. } => ErrorKind::Payload,
            RotationError::Config { .. } => ErrorKind::Config,
            RotationError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Check if the coordinator should re-invoke the step with the same token
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RotationError::DatabaseConnectionFailed { .. }
                | RotationError::DatabaseStatementFailed { .. }
                | RotationError::CredentialValidationFailed { .. }
                | RotationError::StageTransitionConflict { .. }
                | RotationError::SecretStore { .. }
        )
    }
}

impl From<serde_json::Error> for RotationError {
    fn from(error: serde_json::Error) -> Self {
        Self::Payload { context: "JSON (de)serialization failed".to_string(), source: Some(error) }
    }
}

impl From<config::ConfigError> for RotationError {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for RotationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // Display walks nested structs, so `database.connect_timeout_seconds`
        // style paths are reported
        Self::config(format!("Validation failed: {}", errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = RotationError::config("Test configuration error");
        assert!(matches!(error, RotationError::Config { .. }));
        assert_eq!(error.to_string(), "Configuration error: Test configuration error");
    }

    #[test]
    fn test_invalid_state_display() {
        let error = RotationError::invalid_state("db/app", "rotation is not enabled");
        assert_eq!(
            error.to_string(),
            "Invalid rotation state for secret 'db/app': rotation is not enabled"
        );
        assert_eq!(error.kind(), ErrorKind::InvalidRotationState);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(RotationError::connection_failed("postgres", "db1:5432", "timed out").is_retryable());
        assert!(RotationError::statement_failed("mysql", "syntax").is_retryable());
        assert!(RotationError::validation_failed("s", "login refused").is_retryable());
        assert!(RotationError::stage_conflict("s", "no CURRENT").is_retryable());
        assert!(RotationError::store("describe", "throttled").is_retryable());

        assert!(!RotationError::invalid_state("s", "disabled").is_retryable());
        assert!(!RotationError::unsupported_engine("mongodb").is_retryable());
        assert!(!RotationError::secret_not_found("s").is_retryable());
        assert!(!RotationError::config("bad").is_retryable());
    }

    #[test]
    fn test_connection_error_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let error = RotationError::connection_failed_with_source(
            "postgres",
            "db1:5432",
            "connect failed",
            Box::new(io),
        );
        assert!(error.source().is_some());
        assert!(error.to_string().contains("db1:5432"));
    }

    #[test]
    fn test_error_conversions() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error: RotationError = json_error.into();
        assert!(matches!(error, RotationError::Payload { .. }));
        assert_eq!(error.kind().as_str(), "payload");
    }
}
