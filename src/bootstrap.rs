use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::info;

use crate::cache::token_cache::TokenCache;
use crate::config::credentials::inject_credentials;
use crate::config::proc_loader::file_to_config;
use crate::config::proc_validator::{require_identity, validate_service_config};
use crate::config::service::ServiceConfig;
use crate::management::client::ManagementClient;
use crate::service::admin::AdminService;
use crate::sources::issuer::{build_http_client, ClientCredentialsIssuer, TokenIssuer};
use crate::store::{build_store, ParameterStore};

/// Everything a surface needs, wired once at startup.
#[derive(Clone)]
pub struct Components {
    pub config: ServiceConfig,
    pub store: Arc<dyn ParameterStore>,
    pub tokens: Arc<TokenCache>,
    pub admin: AdminService,
}

pub async fn load_config(config_path: &str) -> Result<ServiceConfig> {
    file_to_config(Path::new(config_path))
        .await
        .map_err(|e| anyhow!("Invalid config format: {:#}", e))
}

/// Build the store, inject stored credentials, validate, then wire cache and clients.
/// Missing identity credentials fail here, before any token tier is tried.
pub async fn build(mut config: ServiceConfig) -> Result<Components> {
    let timeout_ms = config.settings.http_timeout_ms();
    let store = build_store(&config.store, timeout_ms).await;
    build_with_store(&mut config, store.clone()).await?;
    assemble(config, store, None)
}

async fn build_with_store(config: &mut ServiceConfig, store: Arc<dyn ParameterStore>) -> Result<()> {
    inject_credentials(&mut config.identity, store.as_ref()).await?;
    require_identity(&config.identity)?;
    validate_service_config(config).await?;
    Ok(())
}

/// Wire components around an existing store and, optionally, a custom issuer.
pub fn assemble(
    config: ServiceConfig,
    store: Arc<dyn ParameterStore>,
    issuer: Option<Arc<dyn TokenIssuer>>,
) -> Result<Components> {
    let client = build_http_client(config.settings.http_timeout_ms())?;
    let issuer = issuer.unwrap_or_else(|| {
        Arc::new(ClientCredentialsIssuer::new(client.clone(), &config.identity)) as Arc<dyn TokenIssuer>
    });
    let tokens = Arc::new(TokenCache::new(store.clone(), issuer, config.cache.clone()));
    let management = ManagementClient::new(client, tokens.clone(), &config.identity);
    info!(
        "components ready: store={}, identity base url={}",
        store.kind(),
        config.identity.base_url()
    );

    Ok(Components {
        admin: AdminService::new(management),
        config,
        store,
        tokens,
    })
}
