//! # Secret Store
//!
//! Versioned, label-staged credential storage used by the rotation engine.
//!
//! A secret holds several versions, each identified by a token (the
//! rotation's idempotency key) and carrying zero or more [`StageLabel`]s.
//! Exactly one version holds [`StageLabel::Current`]; a rotation in flight
//! additionally has a version labelled [`StageLabel::Pending`].
//!
//! # Backends
//!
//! - [`InMemorySecretStore`]: process-local, for tests and dry runs
//! - `AwsSecretStore`: AWS Secrets Manager (feature `aws`)
//!
//! ```rust,ignore
//! use secret_rotator::secrets::{InMemorySecretStore, SecretStore, StageLabel, VersionSelector};
//!
//! let store = InMemorySecretStore::new();
//! let token = store.create_secret("db/app", payload).await?;
//! let current = store.get_version("db/app", VersionSelector::stage(StageLabel::Current)).await?;
//! ```

#[cfg(feature = "aws")]
pub mod aws;
pub mod memory;
pub mod payload;
pub mod store;
pub mod types;

#[cfg(feature = "aws")]
pub use aws::AwsSecretStore;
pub use memory::InMemorySecretStore;
pub use payload::SecretPayload;
pub use store::{SecretStore, VersionSelector};
pub use types::{SecretDescription, SecretString, StageLabel};
