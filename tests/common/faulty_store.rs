//! Secret store wrapper that injects failures into label moves.

use async_trait::async_trait;
use secret_rotator::secrets::{
    InMemorySecretStore, SecretDescription, SecretPayload, SecretStore, StageLabel, VersionSelector,
};
use secret_rotator::{Result, RotationError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Delegates to an [`InMemorySecretStore`] unless a fault is armed
#[derive(Debug)]
pub struct FaultyStore {
    inner: Arc<InMemorySecretStore>,
    pending_detach_failures: AtomicUsize,
    reject_current_move: AtomicBool,
    drop_current_move: AtomicBool,
    hide_current: AtomicBool,
}

impl FaultyStore {
    pub fn new(inner: Arc<InMemorySecretStore>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            pending_detach_failures: AtomicUsize::new(0),
            reject_current_move: AtomicBool::new(false),
            drop_current_move: AtomicBool::new(false),
            hide_current: AtomicBool::new(false),
        })
    }

    /// Fail the next removal of AWSPENDING with a store error
    pub fn fail_pending_detach_once(&self) {
        self.pending_detach_failures.store(1, Ordering::SeqCst);
    }

    /// Reject every AWSCURRENT move the way a store does when the named
    /// holder is stale
    pub fn reject_current_move(&self) {
        self.reject_current_move.store(true, Ordering::SeqCst);
    }

    /// Acknowledge AWSCURRENT moves without applying them
    pub fn drop_current_move(&self) {
        self.drop_current_move.store(true, Ordering::SeqCst);
    }

    /// Report no version as AWSCURRENT from `describe`
    pub fn hide_current(&self) {
        self.hide_current.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SecretStore for FaultyStore {
    async fn describe(&self, secret_id: &str) -> Result<SecretDescription> {
        let mut description = self.inner.describe(secret_id).await?;
        if self.hide_current.load(Ordering::SeqCst) {
            for stages in description.versions.values_mut() {
                stages.remove(&StageLabel::Current);
            }
        }
        Ok(description)
    }

    async fn get_version(
        &self,
        secret_id: &str,
        selector: VersionSelector<'_>,
    ) -> Result<Option<SecretPayload>> {
        self.inner.get_version(secret_id, selector).await
    }

    async fn put_version(
        &self,
        secret_id: &str,
        token: &str,
        payload: &SecretPayload,
        stages: &[StageLabel],
    ) -> Result<()> {
        self.inner.put_version(secret_id, token, payload, stages).await
    }

    async fn update_version_stage(
        &self,
        secret_id: &str,
        label: &StageLabel,
        move_to: Option<&str>,
        remove_from: Option<&str>,
    ) -> Result<()> {
        if *label == StageLabel::Current {
            if self.reject_current_move.load(Ordering::SeqCst) {
                return Err(RotationError::stage_conflict(
                    secret_id,
                    "AWSCURRENT is not attached to the named version",
                ));
            }
            if self.drop_current_move.load(Ordering::SeqCst) {
                return Ok(());
            }
        }

        if *label == StageLabel::Pending
            && move_to.is_none()
            && self
                .pending_detach_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        {
            return Err(RotationError::store("UpdateSecretVersionStage", "throttled"));
        }

        self.inner.update_version_stage(secret_id, label, move_to, remove_from).await
    }

    fn store_type(&self) -> &'static str {
        "faulty"
    }
}
