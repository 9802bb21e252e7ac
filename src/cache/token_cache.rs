use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::cache::token::{CachedToken, StoredToken, TokenTier};
use crate::config::cache::CacheConfig;
use crate::errors::{StoreError, TokenError};
use crate::helpers::time::{Clock, SystemClock};
use crate::observability::metrics::get_metrics;
use crate::sources::issuer::TokenIssuer;
use crate::store::ParameterStore;
use crate::utils::constants::TOKEN_CACHE_PARAMETER_PATH;

/// Read-through cache for the M2M bearer token: memory -> durable store -> issuer.
///
/// The check-then-act sequence is not serialized. Callers that miss at the same
/// time each go to the lower tiers and the last one to finish wins the memory
/// slot. Every outcome is a valid token. The slot lock only guards the swap and
/// is never held across I/O.
pub struct TokenCache {
    memory: RwLock<Option<CachedToken>>,
    store: Arc<dyn ParameterStore>,
    issuer: Arc<dyn TokenIssuer>,
    clock: Arc<dyn Clock>,
    settings: CacheConfig,
    parameter_path: String,
}

impl TokenCache {
    pub fn new(store: Arc<dyn ParameterStore>, issuer: Arc<dyn TokenIssuer>, settings: CacheConfig) -> Self {
        Self::with_clock(store, issuer, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn ParameterStore>,
        issuer: Arc<dyn TokenIssuer>,
        settings: CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            memory: RwLock::new(None),
            store,
            issuer,
            clock,
            settings,
            parameter_path: TOKEN_CACHE_PARAMETER_PATH.to_owned(),
        }
    }

    /// A currently valid bearer token. Fails only when the issuer fails.
    pub async fn get_token(&self) -> Result<String, TokenError> {
        self.get_cached_token().await.map(|token| token.value)
    }

    /// Like `get_token`, with the serving tier and expiry attached.
    pub async fn get_cached_token(&self) -> Result<CachedToken, TokenError> {
        let metrics = get_metrics().await;

        // 1. memory
        if let Some(token) = self.memory_hit() {
            metrics.token_lookups.with_label_values(&[TokenTier::Memory.as_str()]).inc();
            return Ok(token);
        }

        // 2. durable store
        if let Some(token) = self.durable_hit().await {
            info!("token adopted from durable store, expires at {}", token.expires_at);
            metrics.token_lookups.with_label_values(&[TokenTier::DurableStore.as_str()]).inc();
            self.replace(token.clone()).await;
            return Ok(token);
        }

        // 3. issuer
        let value = self.issuer.issue().await?;
        let token = CachedToken::issued(
            value,
            self.clock.now(),
            self.settings.lifetime_seconds,
            self.settings.safety_margin_seconds,
        );
        info!("token issued, expires at {}", token.expires_at);
        metrics.token_lookups.with_label_values(&[TokenTier::Issued.as_str()]).inc();
        self.replace(token.clone()).await;
        self.write_through(&token.to_stored()).await;
        Ok(token)
    }

    /// Drop the memory copy. The durable copy is left alone.
    pub fn invalidate(&self) {
        self.replace_slot(None);
    }

    /// Snapshot of the memory tier, usable or not.
    pub fn current(&self) -> Option<CachedToken> {
        match self.memory.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn parameter_path(&self) -> &str {
        &self.parameter_path
    }

    fn memory_hit(&self) -> Option<CachedToken> {
        let now = self.clock.now();
        self.current()
            .filter(|token| token.is_usable_at(now))
            .map(|token| CachedToken {
                source_tier: TokenTier::Memory,
                ..token
            })
    }

    async fn durable_hit(&self) -> Option<CachedToken> {
        let raw = match self.store.get(&self.parameter_path).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("no token in durable store at '{}'", self.parameter_path);
                return None;
            }
            Err(err) => {
                self.record_store_failure("get", &err).await;
                return None;
            }
        };

        let stored: StoredToken = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(source) => {
                let err = StoreError::Malformed {
                    key: self.parameter_path.clone(),
                    source,
                };
                self.record_store_failure("decode", &err).await;
                return None;
            }
        };

        let now = self.clock.now();
        if !stored.is_usable_at(now) {
            debug!("durable token expired at {} (now {})", stored.expiry, now);
            return None;
        }
        if !stored.is_plausible_at(now, self.settings.lifetime_seconds) {
            let err = StoreError::Implausible {
                key: self.parameter_path.clone(),
                reason: format!(
                    "expiry {} is more than {}s after now ({})",
                    stored.expiry, self.settings.lifetime_seconds, now
                ),
            };
            self.record_store_failure("decode", &err).await;
            return None;
        }
        Some(CachedToken::from_stored(
            stored,
            self.settings.lifetime_seconds,
            self.settings.safety_margin_seconds,
        ))
    }

    async fn write_through(&self, stored: &StoredToken) {
        let payload = match serde_json::to_string(stored) {
            Ok(payload) => payload,
            Err(source) => {
                let err = StoreError::Malformed {
                    key: self.parameter_path.clone(),
                    source,
                };
                self.record_store_failure("encode", &err).await;
                return;
            }
        };

        match self.store.put(&self.parameter_path, &payload, true, true).await {
            Ok(()) => debug!("token written to durable store at '{}'", self.parameter_path),
            Err(err) => self.record_store_failure("put", &err).await,
        }
    }

    async fn record_store_failure(&self, operation: &str, err: &StoreError) {
        warn!("durable store {} failed, continuing: {}", operation, err);
        get_metrics()
            .await
            .store_failures
            .with_label_values(&[self.store.kind(), operation])
            .inc();
    }

    async fn replace(&self, token: CachedToken) {
        get_metrics().await.token_expiry_unix.set(token.expires_at as i64);
        self.replace_slot(Some(token));
    }

    fn replace_slot(&self, token: Option<CachedToken>) {
        match self.memory.write() {
            Ok(mut slot) => *slot = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }
}
