use serde::Deserialize;

use crate::utils::constants::{DEFAULT_SAFETY_MARGIN_SECS, DEFAULT_TOKEN_LIFETIME_SECS};

/// ================================
/// M2M token cache
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// issuer does not report a lifetime; this one is assumed
    #[serde(default = "default_lifetime_seconds")]
    pub lifetime_seconds: u64,
    /// subtracted once from the lifetime when the expiry is computed
    #[serde(default = "default_safety_margin_seconds")]
    pub safety_margin_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            lifetime_seconds: default_lifetime_seconds(),
            safety_margin_seconds: default_safety_margin_seconds(),
        }
    }
}

fn default_lifetime_seconds() -> u64 {
    DEFAULT_TOKEN_LIFETIME_SECS
}

fn default_safety_margin_seconds() -> u64 {
    DEFAULT_SAFETY_MARGIN_SECS
}
