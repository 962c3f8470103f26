//! Four-step rotation state machine.
//!
//! Each call handles exactly one step and keeps nothing between calls; all
//! state is read back from the secret store's version/stage map. Every step
//! is safe to replay with the same token.

use super::event::RotationEvent;
use super::step::RotationStep;
use crate::config::AppConfig;
use crate::database::{ConnectionParams, DriverRegistry};
use crate::errors::{Result, RotationError};
use crate::observability::RotationMetrics;
use crate::password::PasswordPolicy;
use crate::rotation_span;
use crate::secrets::{SecretDescription, SecretPayload, SecretStore, StageLabel, VersionSelector};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

/// Where the token stands in the version map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenState {
    /// Rotation in progress; the step may run
    Pending,
    /// Rotation already completed for this token
    Current,
}

/// Executes rotation steps against a secret store and target databases
#[derive(Debug, Clone)]
pub struct RotationEngine {
    store: Arc<dyn SecretStore>,
    drivers: Arc<DriverRegistry>,
    password_policy: PasswordPolicy,
    metrics: RotationMetrics,
}

impl RotationEngine {
    pub fn new(
        store: Arc<dyn SecretStore>,
        drivers: Arc<DriverRegistry>,
        password_policy: PasswordPolicy,
    ) -> Self {
        Self { store, drivers, password_policy, metrics: RotationMetrics::new() }
    }

    /// Engine with every compiled-in driver, configured from `config`
    pub fn from_config(store: Arc<dyn SecretStore>, config: &AppConfig) -> Self {
        Self::new(
            store,
            Arc::new(DriverRegistry::from_config(&config.database)),
            config.password.clone(),
        )
    }

    pub fn store(&self) -> &Arc<dyn SecretStore> {
        &self.store
    }

    /// Run the step named by a coordinator event
    pub async fn handle_event(&self, event: &RotationEvent) -> Result<()> {
        self.handle_rotation_step(&event.secret_id, &event.client_request_token, event.step).await
    }

    /// Run one step of the rotation identified by `token`.
    ///
    /// # Errors
    /// - [`RotationError::InvalidRotationState`] if rotation is disabled, the
    ///   token is unknown, or the token carries neither PENDING nor CURRENT
    /// - the step-specific errors documented on each step
    pub async fn handle_rotation_step(
        &self,
        secret_id: &str,
        token: &str,
        step: RotationStep,
    ) -> Result<()> {
        let span = rotation_span!(step, secret_id, token, store = self.store.store_type());
        let started = Instant::now();

        let result = self.run_step(secret_id, token, step).instrument(span.clone()).await;

        let outcome = match &result {
            Ok(()) => "success",
            Err(e) => e.kind().as_str(),
        };
        self.metrics.record_step(step.as_str(), outcome, started.elapsed());

        span.in_scope(|| match &result {
            Ok(()) => info!(elapsed_ms = started.elapsed().as_millis() as u64, "Rotation step completed"),
            Err(e) => warn!(
                error = %e,
                kind = %e.kind(),
                retryable = e.is_retryable(),
                "Rotation step failed"
            ),
        });
        result
    }

    async fn run_step(&self, secret_id: &str, token: &str, step: RotationStep) -> Result<()> {
        let description = self.store.describe(secret_id).await?;

        // finishSecret still owns clearing a leftover AWSPENDING label
        if check_token(&description, token)? == TokenState::Current
            && step != RotationStep::FinishSecret
        {
            info!("Token already holds AWSCURRENT; nothing to do");
            return Ok(());
        }

        match step {
            RotationStep::CreateSecret => self.create_secret(secret_id, token).await,
            RotationStep::SetSecret => self.set_secret(secret_id, token).await,
            RotationStep::TestSecret => self.test_secret(secret_id, token).await,
            RotationStep::FinishSecret => self.finish_secret(secret_id, token).await,
        }
    }

    async fn current_payload(&self, secret_id: &str) -> Result<SecretPayload> {
        self.store
            .get_version(secret_id, VersionSelector::stage(StageLabel::Current))
            .await?
            .ok_or_else(|| RotationError::invalid_state(secret_id, "no AWSCURRENT version has a value"))
    }

    async fn pending_payload(&self, secret_id: &str, token: &str) -> Result<Option<SecretPayload>> {
        self.store
            .get_version(secret_id, VersionSelector::token_with_stage(token, StageLabel::Pending))
            .await
    }

    /// Stage a copy of CURRENT with a freshly generated password under
    /// `token`. An existing PENDING value for the token is never replaced.
    async fn create_secret(&self, secret_id: &str, token: &str) -> Result<()> {
        let current = self.current_payload(secret_id).await?;

        if self.pending_payload(secret_id, token).await?.is_some() {
            info!("AWSPENDING value already exists for token; skipping generation");
            return Ok(());
        }

        let pending = current.with_password(self.password_policy.generate()?);
        self.store.put_version(secret_id, token, &pending, &[StageLabel::Pending]).await?;

        info!(engine = %pending.engine, "Staged new AWSPENDING version");
        Ok(())
    }

    /// Apply the PENDING password to the database, logging in as CURRENT.
    ///
    /// # Errors
    /// - [`RotationError::UnsupportedEngine`] before any connection for an
    ///   unknown engine or one without a driver
    /// - [`RotationError::InvalidRotationState`] if no PENDING value exists,
    ///   or PENDING names a different account than CURRENT
    /// - [`RotationError::DatabaseConnectionFailed`] /
    ///   [`RotationError::DatabaseStatementFailed`] from the driver
    async fn set_secret(&self, secret_id: &str, token: &str) -> Result<()> {
        let current = self.current_payload(secret_id).await?;
        let pending = self.pending_payload(secret_id, token).await?.ok_or_else(|| {
            RotationError::invalid_state(secret_id, "token has no AWSPENDING value; run createSecret first")
        })?;

        let engine = current.engine_kind()?;
        tracing::Span::current().record("engine", engine.as_str());

        if pending.engine_kind()? != engine
            || pending.username != current.username
            || pending.host != current.host
        {
            return Err(RotationError::invalid_state(
                secret_id,
                "AWSPENDING engine, username or host differs from AWSCURRENT",
            ));
        }

        let driver = self.drivers.driver(engine)?;
        let current_params = current.connection_params()?;
        let pending_params = ConnectionParams {
            password: pending.password.clone(),
            ..current_params.clone()
        };

        // A replayed setSecret finds the new password already working
        match driver.check_connection(&pending_params).await {
            Ok(()) => {
                info!("AWSPENDING credentials already valid; password change previously applied");
                return Ok(());
            }
            Err(e) => debug!(error = %e, "AWSPENDING login failed; applying password change"),
        }

        driver.change_password(&current_params, &pending.username, &pending.password).await?;
        self.metrics.record_password_change(engine.as_str());

        info!(username = %pending.username, "Applied AWSPENDING password to database");
        Ok(())
    }

    /// Log in with the PENDING credentials and run the engine's probe.
    async fn test_secret(&self, secret_id: &str, token: &str) -> Result<()> {
        let pending = self.pending_payload(secret_id, token).await?.ok_or_else(|| {
            RotationError::invalid_state(secret_id, "token has no AWSPENDING value; run createSecret first")
        })?;

        let engine = pending.engine_kind()?;
        tracing::Span::current().record("engine", engine.as_str());

        let driver = self.drivers.driver(engine)?;
        let params = pending.connection_params()?;

        driver
            .check_connection(&params)
            .await
            .map_err(|e| RotationError::validation_failed(secret_id, e.to_string()))?;

        info!(endpoint = %params.endpoint(), "AWSPENDING credentials validated");
        Ok(())
    }

    /// Move CURRENT onto `token`, confirm, then clear PENDING from it. A
    /// token that is already CURRENT only has a leftover PENDING removed.
    ///
    /// # Errors
    /// - [`RotationError::StageTransitionConflict`] if no version holds
    ///   CURRENT, the store rejects the move, or the re-read map does not show
    ///   the token as CURRENT
    async fn finish_secret(&self, secret_id: &str, token: &str) -> Result<()> {
        let description = self.store.describe(secret_id).await?;
        if description.has_stage(token, &StageLabel::Current) {
            if description.has_stage(token, &StageLabel::Pending) {
                self.clear_pending(secret_id, token).await?;
                info!("Cleared leftover AWSPENDING from promoted token");
            } else {
                info!("Token already holds AWSCURRENT; nothing to do");
            }
            return Ok(());
        }

        let previous = description
            .version_with_stage(&StageLabel::Current)
            .map(str::to_string)
            .ok_or_else(|| RotationError::stage_conflict(secret_id, "no version holds AWSCURRENT"))?;

        self.store
            .update_version_stage(secret_id, &StageLabel::Current, Some(token), Some(&previous))
            .await?;

        let confirmed = self.store.describe(secret_id).await?;
        if !confirmed.has_stage(token, &StageLabel::Current)
            || confirmed.count_with_stage(&StageLabel::Current) != 1
        {
            return Err(RotationError::stage_conflict(
                secret_id,
                "AWSCURRENT move was not reflected by the store",
            ));
        }

        if confirmed.has_stage(token, &StageLabel::Pending) {
            self.clear_pending(secret_id, token).await?;
        }

        info!(previous_version = %previous, "Promoted token to AWSCURRENT");
        Ok(())
    }

    async fn clear_pending(&self, secret_id: &str, token: &str) -> Result<()> {
        self.store
            .update_version_stage(secret_id, &StageLabel::Pending, None, Some(token))
            .await
    }
}

/// Gate applied before every step: rotation must be enabled and the token
/// must be a known version carrying PENDING or CURRENT.
fn check_token(description: &SecretDescription, token: &str) -> Result<TokenState> {
    let secret_id = description.secret_id.as_str();

    if !description.rotation_enabled {
        return Err(RotationError::invalid_state(secret_id, "rotation is not enabled"));
    }

    let stages = description.stages(token).ok_or_else(|| {
        RotationError::invalid_state(secret_id, format!("version {} is not a version of the secret", token))
    })?;

    if stages.contains(&StageLabel::Current) {
        Ok(TokenState::Current)
    } else if stages.contains(&StageLabel::Pending) {
        Ok(TokenState::Pending)
    } else {
        Err(RotationError::invalid_state(
            secret_id,
            format!("version {} is not staged AWSPENDING", token),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn description(enabled: bool, stages: &[(&str, &[StageLabel])]) -> SecretDescription {
        let mut description = SecretDescription::new("db/app", enabled);
        for (token, labels) in stages {
            description.versions.insert(token.to_string(), labels.iter().cloned().collect::<BTreeSet<_>>());
        }
        description
    }

    #[test]
    fn test_gate_requires_rotation_enabled() {
        let desc = description(false, &[("t1", &[StageLabel::Pending])]);
        let err = check_token(&desc, "t1").unwrap_err();
        assert!(err.to_string().contains("not enabled"));
    }

    #[test]
    fn test_gate_states() {
        let desc = description(
            true,
            &[
                ("old", &[StageLabel::Current]),
                ("new", &[StageLabel::Pending]),
                ("stale", &[StageLabel::Previous]),
            ],
        );
        assert_eq!(check_token(&desc, "new").unwrap(), TokenState::Pending);
        assert_eq!(check_token(&desc, "old").unwrap(), TokenState::Current);
        assert!(matches!(
            check_token(&desc, "stale"),
            Err(RotationError::InvalidRotationState { .. })
        ));
        assert!(matches!(
            check_token(&desc, "missing"),
            Err(RotationError::InvalidRotationState { .. })
        ));
    }
}
