//! In-process secret store.
//!
//! Mirrors the staging semantics of a managed secrets service closely enough
//! to drive the whole rotation protocol in tests and local runs:
//!
//! - moving `AWSCURRENT` labels the previous holder `AWSPREVIOUS`
//! - a version can be staged before its value exists (the coordinator does
//!   this when it starts a rotation)
//! - stored values are immutable
//!
//! All mutations take the write lock for their whole duration, so label moves
//! are atomic to concurrent readers.

use super::payload::SecretPayload;
use super::store::{SecretStore, VersionSelector};
use super::types::{SecretDescription, StageLabel};
use crate::errors::{Result, RotationError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct StoredVersion {
    stages: BTreeSet<StageLabel>,
    payload: Option<SecretPayload>,
}

#[derive(Debug, Clone, Default)]
struct StoredSecret {
    rotation_enabled: bool,
    versions: BTreeMap<String, StoredVersion>,
    last_rotated: Option<DateTime<Utc>>,
}

impl StoredSecret {
    fn holder_of(&self, label: &StageLabel) -> Option<String> {
        self.versions
            .iter()
            .find(|(_, version)| version.stages.contains(label))
            .map(|(token, _)| token.clone())
    }

    /// Detach `label` from every version except `keep`.
    fn detach_elsewhere(&mut self, label: &StageLabel, keep: &str) {
        for (token, version) in self.versions.iter_mut() {
            if token != keep {
                version.stages.remove(label);
            }
        }
    }

    fn describe(&self, secret_id: &str) -> SecretDescription {
        SecretDescription {
            secret_id: secret_id.to_string(),
            rotation_enabled: self.rotation_enabled,
            versions: self
                .versions
                .iter()
                .map(|(token, version)| (token.clone(), version.stages.clone()))
                .collect(),
            last_rotated: self.last_rotated,
        }
    }
}

/// Secret store held entirely in memory
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    secrets: RwLock<HashMap<String, StoredSecret>>,
    mutations: AtomicU64,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a secret whose first version is `payload`, labeled CURRENT.
    /// Returns the generated version token.
    pub async fn create_secret(&self, secret_id: &str, payload: SecretPayload) -> Result<String> {
        let mut secrets = self.secrets.write().await;
        if secrets.contains_key(secret_id) {
            return Err(RotationError::invalid_state(secret_id, "secret already exists"));
        }

        let token = Uuid::new_v4().to_string();
        let mut secret = StoredSecret::default();
        secret.versions.insert(
            token.clone(),
            StoredVersion {
                stages: BTreeSet::from([StageLabel::Current]),
                payload: Some(payload),
            },
        );
        secrets.insert(secret_id.to_string(), secret);
        self.bump();

        debug!(secret_id = %secret_id, version = %token, "Created secret");
        Ok(token)
    }

    pub async fn set_rotation_enabled(&self, secret_id: &str, enabled: bool) -> Result<()> {
        let mut secrets = self.secrets.write().await;
        let secret = secrets
            .get_mut(secret_id)
            .ok_or_else(|| RotationError::secret_not_found(secret_id))?;
        secret.rotation_enabled = enabled;
        self.bump();
        Ok(())
    }

    /// Begin a rotation the way the coordinator does: register `token` as a
    /// value-less version and move `AWSPENDING` onto it.
    pub async fn stage_pending(&self, secret_id: &str, token: &str) -> Result<()> {
        let mut secrets = self.secrets.write().await;
        let secret = secrets
            .get_mut(secret_id)
            .ok_or_else(|| RotationError::secret_not_found(secret_id))?;

        secret.detach_elsewhere(&StageLabel::Pending, token);
        secret.versions.entry(token.to_string()).or_default().stages.insert(StageLabel::Pending);
        self.bump();
        Ok(())
    }

    /// Stored value of a specific version, regardless of labels.
    pub async fn payload(&self, secret_id: &str, token: &str) -> Option<SecretPayload> {
        let secrets = self.secrets.read().await;
        secrets.get(secret_id)?.versions.get(token)?.payload.clone()
    }

    /// Number of successful mutating calls since construction.
    pub fn mutation_count(&self) -> u64 {
        self.mutations.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn describe(&self, secret_id: &str) -> Result<SecretDescription> {
        let secrets = self.secrets.read().await;
        secrets
            .get(secret_id)
            .map(|secret| secret.describe(secret_id))
            .ok_or_else(|| RotationError::secret_not_found(secret_id))
    }

    async fn get_version(
        &self,
        secret_id: &str,
        selector: VersionSelector<'_>,
    ) -> Result<Option<SecretPayload>> {
        let secrets = self.secrets.read().await;
        let secret =
            secrets.get(secret_id).ok_or_else(|| RotationError::secret_not_found(secret_id))?;

        let version = match selector {
            VersionSelector::Stage(label) => {
                secret.versions.values().find(|version| version.stages.contains(&label))
            }
            VersionSelector::Token { token, stage } => secret
                .versions
                .get(token)
                .filter(|version| stage.as_ref().map_or(true, |label| version.stages.contains(label))),
        };

        Ok(version.and_then(|version| version.payload.clone()))
    }

    async fn put_version(
        &self,
        secret_id: &str,
        token: &str,
        payload: &SecretPayload,
        stages: &[StageLabel],
    ) -> Result<()> {
        let mut secrets = self.secrets.write().await;
        let secret = secrets
            .get_mut(secret_id)
            .ok_or_else(|| RotationError::secret_not_found(secret_id))?;

        let version = secret.versions.entry(token.to_string()).or_default();
        if version.payload.as_ref().is_some_and(|existing| existing != payload) {
            return Err(RotationError::invalid_state(
                secret_id,
                format!("version {} already holds a different value", token),
            ));
        }
        if version.payload.is_none() {
            version.payload = Some(payload.clone());
        }
        version.stages.extend(stages.iter().cloned());

        for label in stages {
            secret.detach_elsewhere(label, token);
        }
        self.bump();

        debug!(secret_id = %secret_id, version = %token, ?stages, "Stored secret version");
        Ok(())
    }

    async fn update_version_stage(
        &self,
        secret_id: &str,
        label: &StageLabel,
        move_to: Option<&str>,
        remove_from: Option<&str>,
    ) -> Result<()> {
        let mut secrets = self.secrets.write().await;
        let secret = secrets
            .get_mut(secret_id)
            .ok_or_else(|| RotationError::secret_not_found(secret_id))?;

        if let Some(target) = move_to {
            if !secret.versions.contains_key(target) {
                return Err(RotationError::stage_conflict(
                    secret_id,
                    format!("cannot move {} to unknown version {}", label, target),
                ));
            }
        }

        let holder = secret.holder_of(label);
        match (holder.as_deref(), remove_from) {
            (Some(current), Some(from)) if current != from => {
                return Err(RotationError::stage_conflict(
                    secret_id,
                    format!("{} is held by {}, not {}", label, current, from),
                ));
            }
            (None, Some(from)) => {
                return Err(RotationError::stage_conflict(
                    secret_id,
                    format!("{} is not attached to {}", label, from),
                ));
            }
            (Some(current), None) if Some(current) != move_to => {
                return Err(RotationError::stage_conflict(
                    secret_id,
                    format!("{} is held by {}; name it as the version to remove from", label, current),
                ));
            }
            _ => {}
        }

        if let Some(from) = remove_from {
            if let Some(version) = secret.versions.get_mut(from) {
                version.stages.remove(label);
            }
        }
        if let Some(target) = move_to {
            if let Some(version) = secret.versions.get_mut(target) {
                version.stages.insert(label.clone());
            }
        }

        if *label == StageLabel::Current {
            if let Some(from) = remove_from.filter(|from| Some(*from) != move_to) {
                secret.detach_elsewhere(&StageLabel::Previous, from);
                if let Some(version) = secret.versions.get_mut(from) {
                    version.stages.insert(StageLabel::Previous);
                }
            }
            secret.last_rotated = Some(Utc::now());
        }
        self.bump();

        debug!(
            secret_id = %secret_id,
            label = %label,
            move_to = ?move_to,
            remove_from = ?remove_from,
            "Updated version stage"
        );
        Ok(())
    }

    fn store_type(&self) -> &'static str {
        "memory"
    }
}
