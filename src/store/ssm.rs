use std::time::Duration;

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ssm::types::ParameterType;
use aws_sdk_ssm::Client as SsmClient;
use tracing::{debug, info};

use crate::config::store::StoreConfig;
use crate::errors::StoreError;
use crate::store::ParameterStore;

/// AWS Systems Manager Parameter Store. Encrypted values are written as `SecureString`
/// and always read back with decryption.
#[derive(Clone)]
pub struct SsmParameterStore {
    client: SsmClient,
}

impl std::fmt::Debug for SsmParameterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsmParameterStore").finish_non_exhaustive()
    }
}

impl SsmParameterStore {
    /// Region falls back to the SDK chain (AWS_REGION, profile, IMDS) when not configured.
    pub async fn new(cfg: &StoreConfig, timeout_ms: u64) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(Duration::from_millis(timeout_ms))
                .build(),
        );
        if let Some(region) = &cfg.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &cfg.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        info!(region = ?cfg.region, endpoint = ?cfg.endpoint_url, "initialized SSM parameter store");
        Self::from_client(SsmClient::new(&sdk_config))
    }

    pub fn from_client(client: SsmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let result = self
            .client
            .get_parameter()
            .name(key)
            .with_decryption(true)
            .send()
            .await;

        match result {
            Ok(output) => Ok(output
                .parameter()
                .and_then(|parameter| parameter.value())
                .map(str::to_owned)),
            Err(err) => {
                if err.as_service_error().is_some_and(|e| e.is_parameter_not_found()) {
                    debug!("parameter '{}' not found", key);
                    return Ok(None);
                }
                Err(StoreError::Unavailable {
                    key: key.to_owned(),
                    reason: err.to_string(),
                })
            }
        }
    }

    async fn put(&self, key: &str, value: &str, encrypted: bool, overwrite: bool) -> Result<(), StoreError> {
        let parameter_type = if encrypted {
            ParameterType::SecureString
        } else {
            ParameterType::String
        };

        self.client
            .put_parameter()
            .name(key)
            .value(value)
            .r#type(parameter_type)
            .overwrite(overwrite)
            .send()
            .await
            .map(|_| ())
            .map_err(|err| {
                if err.as_service_error().is_some_and(|e| e.is_parameter_already_exists()) {
                    StoreError::AlreadyExists { key: key.to_owned() }
                } else {
                    StoreError::Unavailable {
                        key: key.to_owned(),
                        reason: err.to_string(),
                    }
                }
            })
    }

    fn kind(&self) -> &'static str {
        "ssm"
    }
}
