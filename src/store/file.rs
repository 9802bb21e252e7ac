use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::StoreError;
use crate::store::ParameterStore;

/// All parameters live in one JSON object file, rewritten atomically (tmp -> rename, 0600).
/// There is no encryption at rest; `encrypted` is accepted and ignored.
#[derive(Debug)]
pub struct FileParameterStore {
    path: PathBuf,
    // serializes read-modify-write within this process
    write_lock: Mutex<()>,
}

impl FileParameterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self, key: &str) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|source| StoreError::Malformed {
                key: key.to_owned(),
                source,
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(StoreError::Io { key: key.to_owned(), source }),
        }
    }

    async fn persist(&self, key: &str, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io { key: key.to_owned(), source };
        let content = serde_json::to_vec_pretty(map).map_err(|source| StoreError::Malformed {
            key: key.to_owned(),
            source,
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content).await.map_err(io_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(io_err)?;
        }
        fs::rename(&tmp, &self.path).await.map_err(io_err)
    }
}

#[async_trait]
impl ParameterStore for FileParameterStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load(key).await?.remove(key))
    }

    async fn put(&self, key: &str, value: &str, encrypted: bool, overwrite: bool) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.load(key).await?;
        if !overwrite && map.contains_key(key) {
            return Err(StoreError::AlreadyExists { key: key.to_owned() });
        }
        if encrypted {
            debug!("file parameter store keeps '{}' unencrypted", key);
        }
        map.insert(key.to_owned(), value.to_owned());
        self.persist(key, &map).await
    }

    fn kind(&self) -> &'static str {
        "file"
    }
}
