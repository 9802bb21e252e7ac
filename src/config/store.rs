use serde::Deserialize;

use crate::utils::constants::DEFAULT_FILE_STORE_PATH;

/// ================================
/// Durable parameter store
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StoreKind,
    pub region: Option<String>,
    /// LocalStack or another SSM-compatible endpoint
    pub endpoint_url: Option<String>,
    /// file store location
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            region: None,
            endpoint_url: None,
            path: default_path(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Ssm,
    File,
    Memory,
}

fn default_path() -> String {
    DEFAULT_FILE_STORE_PATH.to_string()
}
