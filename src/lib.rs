//! # secret-rotator
//!
//! Four-step credential rotation for relational databases whose passwords
//! live in a versioned secret store.
//!
//! ## Architecture
//!
//! ```text
//! Coordinator ──step──▶ RotationEngine ──▶ SecretStore (versions + stage labels)
//!                             │
//!                             └──────────▶ DatabaseDriver (postgres | mysql | oracle)
//! ```
//!
//! A coordinator invokes `createSecret`, `setSecret`, `testSecret` and
//! `finishSecret` in order with one client request token. The engine is
//! stateless: every step re-reads the version/stage map, validates the token,
//! and is safe to replay.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use secret_rotator::{
//!     config::AppConfig, rotation::RotationStep, secrets::InMemorySecretStore, Result,
//!     RotationEngine,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let store = Arc::new(InMemorySecretStore::new());
//!     let engine = RotationEngine::from_config(store, &config);
//!     engine
//!         .handle_rotation_step("db/app", "token-1", RotationStep::CreateSecret)
//!         .await
//! }
//! ```

pub mod cli;
pub mod config;
pub mod database;
pub mod errors;
pub mod observability;
pub mod password;
pub mod rotation;
pub mod secrets;

// Re-export commonly used types and traits
pub use config::AppConfig;
pub use errors::{Result, RotationError};
pub use rotation::{RotationEngine, RotationEvent, RotationStep};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
