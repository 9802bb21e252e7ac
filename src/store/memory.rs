use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::StoreError;
use crate::store::ParameterStore;

#[derive(Debug, Clone, Default)]
pub struct InMemoryParameterStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ParameterStore for InMemoryParameterStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str, _encrypted: bool, overwrite: bool) -> Result<(), StoreError> {
        let mut map = self.inner.write().await;
        if !overwrite && map.contains_key(key) {
            return Err(StoreError::AlreadyExists { key: key.to_owned() });
        }
        map.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}
