use std::fmt;

use serde::{Deserialize, Serialize};

/// Which tier handed out the currently held copy. Informational, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenTier {
    Memory,
    DurableStore,
    Issued,
}

impl TokenTier {
    pub fn as_str(&self) -> &'static str {
        match *self {
            TokenTier::Memory => "memory",
            TokenTier::DurableStore => "durable_store",
            TokenTier::Issued => "issued",
        }
    }
}

impl fmt::Display for TokenTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bearer token held by the memory tier
#[derive(Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub value: String,
    pub issued_at: u64,  // UNIX TIMESTAMP
    pub expires_at: u64, // UNIX TIMESTAMP, safety buffer already subtracted
    pub source_tier: TokenTier,
}

impl CachedToken {
    /// `expires_at = issued_at + lifetime - safety_margin`, floored at `issued_at`.
    pub fn issued(value: String, issued_at: u64, lifetime_seconds: u64, safety_margin_seconds: u64) -> Self {
        let expires_at = issued_at
            .saturating_add(lifetime_seconds)
            .saturating_sub(safety_margin_seconds)
            .max(issued_at);
        Self {
            value,
            issued_at,
            expires_at,
            source_tier: TokenTier::Issued,
        }
    }

    /// Rebuild a memory token from a durable-store blob.
    pub fn from_stored(stored: StoredToken, lifetime_seconds: u64, safety_margin_seconds: u64) -> Self {
        let issued_at = stored
            .expiry
            .saturating_add(safety_margin_seconds)
            .saturating_sub(lifetime_seconds);
        Self {
            value: stored.token,
            issued_at,
            expires_at: stored.expiry,
            source_tier: TokenTier::DurableStore,
        }
    }

    pub fn is_usable_at(&self, now: u64) -> bool {
        now < self.expires_at
    }

    pub fn to_stored(&self) -> StoredToken {
        StoredToken {
            token: self.value.clone(),
            expiry: self.expires_at,
        }
    }
}

// token value stays out of logs
impl fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedToken")
            .field("value", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("source_tier", &self.source_tier)
            .finish()
    }
}

/// Durable-tier blob: `{"token": "...", "expiry": 1700000000}`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    pub expiry: u64,
}

impl StoredToken {
    pub fn is_usable_at(&self, now: u64) -> bool {
        now < self.expiry
    }

    /// A token issued at or before `now` cannot expire later than `now + lifetime`.
    pub fn is_plausible_at(&self, now: u64, lifetime_seconds: u64) -> bool {
        self.expiry <= now.saturating_add(lifetime_seconds)
    }
}

impl fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredToken")
            .field("token", &"<redacted>")
            .field("expiry", &self.expiry)
            .finish()
    }
}
