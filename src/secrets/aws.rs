//! AWS Secrets Manager store
//!
//! Maps the [`SecretStore`] operations onto `DescribeSecret`,
//! `GetSecretValue`, `PutSecretValue` and `UpdateSecretVersionStage`. Service
//! error codes are translated into the rotation error taxonomy; no SDK-level
//! retries beyond the client defaults are added here.

use super::payload::SecretPayload;
use super::store::{SecretStore, VersionSelector};
use super::types::{SecretDescription, StageLabel};
use crate::config::StoreConfig;
use crate::errors::{Result, RotationError};
use async_trait::async_trait;
use aws_sdk_secretsmanager::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_secretsmanager::Client as SecretsManagerClient;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";
const RESOURCE_EXISTS: &str = "ResourceExistsException";
const INVALID_PARAMETER: &str = "InvalidParameterException";
const INVALID_REQUEST: &str = "InvalidRequestException";

/// Secret store backed by AWS Secrets Manager
#[derive(Debug, Clone)]
pub struct AwsSecretStore {
    client: SecretsManagerClient,
}

impl AwsSecretStore {
    /// Build a client from the default credential chain.
    ///
    /// Region falls back to `AWS_REGION` / profile resolution when not set in
    /// `config`; `endpoint_url` targets LocalStack or a VPC endpoint.
    pub async fn new(config: &StoreConfig) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = &config.aws_region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        info!(
            region = ?sdk_config.region(),
            endpoint = ?config.endpoint_url,
            "Initialized AWS Secrets Manager store"
        );

        Ok(Self::from_client(SecretsManagerClient::new(&sdk_config)))
    }

    pub fn from_client(client: SecretsManagerClient) -> Self {
        Self { client }
    }
}

fn sdk_error<E>(operation: &str, secret_id: &str, error: &E) -> RotationError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    match error.code() {
        Some(RESOURCE_NOT_FOUND) => RotationError::secret_not_found(secret_id),
        _ => RotationError::store(operation, DisplayErrorContext(error).to_string()),
    }
}

fn to_utc(timestamp: &aws_sdk_secretsmanager::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

#[async_trait]
impl SecretStore for AwsSecretStore {
    #[instrument(skip(self))]
    async fn describe(&self, secret_id: &str) -> Result<SecretDescription> {
        let output = self
            .client
            .describe_secret()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| sdk_error("DescribeSecret", secret_id, &e))?;

        let mut description =
            SecretDescription::new(secret_id, output.rotation_enabled().unwrap_or(false));
        if let Some(versions) = output.version_ids_to_stages() {
            for (version_id, stages) in versions {
                description.versions.insert(
                    version_id.clone(),
                    stages.iter().map(|s| StageLabel::from(s.clone())).collect(),
                );
            }
        }
        description.last_rotated = output.last_rotated_date().and_then(to_utc);

        debug!(versions = description.versions.len(), "Described secret");
        Ok(description)
    }

    #[instrument(skip(self))]
    async fn get_version(
        &self,
        secret_id: &str,
        selector: VersionSelector<'_>,
    ) -> Result<Option<SecretPayload>> {
        let mut request = self.client.get_secret_value().secret_id(secret_id);
        request = match &selector {
            VersionSelector::Stage(label) => request.version_stage(label.as_str()),
            VersionSelector::Token { token, stage } => request
                .version_id(*token)
                .set_version_stage(stage.as_ref().map(|label| label.as_str().to_string())),
        };

        let output = match request.send().await {
            Ok(output) => output,
            Err(e) => {
                // A missing version or a label mismatch is an absent value,
                // not a failure
                return match e.code() {
                    Some(RESOURCE_NOT_FOUND) => Ok(None),
                    _ => Err(sdk_error("GetSecretValue", secret_id, &e)),
                };
            }
        };

        match output.secret_string() {
            Some(raw) => SecretPayload::from_json(raw).map(Some),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, payload))]
    async fn put_version(
        &self,
        secret_id: &str,
        token: &str,
        payload: &SecretPayload,
        stages: &[StageLabel],
    ) -> Result<()> {
        let secret_string = payload.to_json()?;

        self.client
            .put_secret_value()
            .secret_id(secret_id)
            .client_request_token(token)
            .secret_string(secret_string)
            .set_version_stages(Some(stages.iter().map(|s| s.as_str().to_string()).collect()))
            .send()
            .await
            .map_err(|e| match e.code() {
                Some(RESOURCE_EXISTS) => RotationError::invalid_state(
                    secret_id,
                    format!("version {} already holds a different value", token),
                ),
                _ => sdk_error("PutSecretValue", secret_id, &e),
            })?;

        info!("Stored new secret version");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_version_stage(
        &self,
        secret_id: &str,
        label: &StageLabel,
        move_to: Option<&str>,
        remove_from: Option<&str>,
    ) -> Result<()> {
        self.client
            .update_secret_version_stage()
            .secret_id(secret_id)
            .version_stage(label.as_str())
            .set_move_to_version_id(move_to.map(str::to_string))
            .set_remove_from_version_id(remove_from.map(str::to_string))
            .send()
            .await
            .map_err(|e| match e.code() {
                Some(INVALID_PARAMETER) | Some(INVALID_REQUEST) => RotationError::stage_conflict(
                    secret_id,
                    format!(
                        "moving {} rejected: {}",
                        label,
                        e.message().unwrap_or("no detail from service")
                    ),
                ),
                _ => sdk_error("UpdateSecretVersionStage", secret_id, &e),
            })?;

        info!("Moved version stage");
        Ok(())
    }

    fn store_type(&self) -> &'static str {
        "aws_secrets_manager"
    }
}
