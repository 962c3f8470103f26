//! Secret store trait consumed by the rotation engine.

use super::payload::SecretPayload;
use super::types::{SecretDescription, StageLabel};
use crate::errors::Result;
use async_trait::async_trait;

/// Which version of a secret to read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelector<'a> {
    /// Whichever version currently carries the label
    Stage(StageLabel),
    /// A specific version, optionally required to carry a label
    Token { token: &'a str, stage: Option<StageLabel> },
}

impl<'a> VersionSelector<'a> {
    pub fn stage(label: StageLabel) -> Self {
        Self::Stage(label)
    }

    pub fn token(token: &'a str) -> Self {
        Self::Token { token, stage: None }
    }

    pub fn token_with_stage(token: &'a str, label: StageLabel) -> Self {
        Self::Token { token, stage: Some(label) }
    }
}

/// Versioned, label-staged credential storage.
///
/// Implementations must make [`SecretStore::update_version_stage`] atomic: a
/// concurrent `describe` sees the label on either the old or the new version,
/// never on neither.
#[async_trait]
pub trait SecretStore: Send + Sync + std::fmt::Debug {
    /// Rotation flag and version/stage map.
    ///
    /// # Errors
    /// - [`crate::errors::RotationError::SecretNotFound`] if the secret doesn't exist
    async fn describe(&self, secret_id: &str) -> Result<SecretDescription>;

    /// Payload of the selected version; `Ok(None)` when the selection has no
    /// stored value (no such version, label mismatch, or a version staged
    /// before its value was written).
    async fn get_version(
        &self,
        secret_id: &str,
        selector: VersionSelector<'_>,
    ) -> Result<Option<SecretPayload>>;

    /// Store `payload` as version `token` carrying `stages`. Labels are moved
    /// off any other version that held them. Writing an identical payload to
    /// an existing token succeeds; a different payload is rejected.
    async fn put_version(
        &self,
        secret_id: &str,
        token: &str,
        payload: &SecretPayload,
        stages: &[StageLabel],
    ) -> Result<()>;

    /// Attach `label` to `move_to` and detach it from `remove_from` in one
    /// step. Either side may be omitted to only attach or only detach.
    ///
    /// # Errors
    /// - [`crate::errors::RotationError::StageTransitionConflict`] if the label
    ///   is held by a version other than `remove_from`
    async fn update_version_stage(
        &self,
        secret_id: &str,
        label: &StageLabel,
        move_to: Option<&str>,
        remove_from: Option<&str>,
    ) -> Result<()>;

    /// Backend name for logs
    fn store_type(&self) -> &'static str;
}
