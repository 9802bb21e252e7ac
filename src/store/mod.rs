//! Durable key-value parameter store backing the second token tier.
//!
//! - `ssm`: AWS Systems Manager Parameter Store (production)
//! - `file`: a JSON file on local disk (development)
//! - `memory`: process-local map (tests, ephemeral runs)

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::store::{StoreConfig, StoreKind};
use crate::errors::StoreError;

pub mod file;
pub mod memory;
pub mod ssm;

use file::FileParameterStore;
use memory::InMemoryParameterStore;
use ssm::SsmParameterStore;

#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// `Ok(None)` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn put(&self, key: &str, value: &str, encrypted: bool, overwrite: bool) -> Result<(), StoreError>;

    fn kind(&self) -> &'static str;
}

/// Build the configured store.
pub async fn build_store(cfg: &StoreConfig, timeout_ms: u64) -> Arc<dyn ParameterStore> {
    info!("parameter store kind: {:?}", cfg.kind);
    match cfg.kind {
        StoreKind::Ssm => Arc::new(SsmParameterStore::new(cfg, timeout_ms).await),
        StoreKind::File => Arc::new(FileParameterStore::new(cfg.path.clone())),
        StoreKind::Memory => Arc::new(InMemoryParameterStore::new()),
    }
}
