//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Identity credentials must be present before any token tier is tried
//! - Cache arithmetic, server, logging, idle-shutdown and store invariants

use tracing::{error, info};

use crate::config::cache::CacheConfig;
use crate::config::identity::IdentityConfig;
use crate::config::service::ServiceConfig;
use crate::config::settings::SettingsConfig;
use crate::config::store::{StoreConfig, StoreKind};
use crate::errors::ConfigError;
use crate::observability::metrics::get_metrics;
use crate::utils::constants::MAX_TOKEN_LIFETIME_SECONDS;

/// Returns the first missing identity credential, in the order an operator would fix them.
pub fn require_identity(identity: &IdentityConfig) -> Result<(), ConfigError> {
    if identity.domain.trim().is_empty() {
        return Err(ConfigError::Missing("identity.domain"));
    }
    if identity.client_id.trim().is_empty() {
        return Err(ConfigError::Missing("identity.client_id"));
    }
    if identity.client_secret.trim().is_empty() {
        return Err(ConfigError::Missing("identity.client_secret"));
    }
    Ok(())
}

/// Public entrypoint: Ok(()) or ConfigError::Invalid with every issue found.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), ConfigError> {
    let errors = collect_errors(cfg);

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        get_metrics().await.config_validation_errors.inc();
        Err(ConfigError::Invalid(errors))
    }
}

pub fn collect_errors(cfg: &ServiceConfig) -> Vec<String> {
    let mut errors: Vec<String> = Vec::new();

    validate_identity(&cfg.identity, &mut errors);
    validate_cache(&cfg.cache, &mut errors);
    validate_settings(&cfg.settings, &mut errors);
    validate_store(&cfg.store, &mut errors);

    errors
}

/// IDENTITY VALIDATION
fn validate_identity(identity: &IdentityConfig, errors: &mut Vec<String>) {
    for (name, value) in [
        ("identity.domain", &identity.domain),
        ("identity.client_id", &identity.client_id),
        ("identity.client_secret", &identity.client_secret),
    ] {
        if value.trim().is_empty() {
            errors.push(format!("{} is required", name));
        }
    }

    if identity.domain.contains("://") || identity.domain.contains('/') {
        errors.push(format!(
            "identity.domain '{}' must be a bare host name, e.g. 'tenant.example.com'",
            identity.domain
        ));
    }

    if let Some(base_url) = &identity.base_url {
        if !base_url.is_empty() && !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            errors.push(format!("identity.base_url '{}' must start with http:// or https://", base_url));
        }
    }
}

/// CACHE VALIDATION
fn validate_cache(cache: &CacheConfig, errors: &mut Vec<String>) {
    if cache.lifetime_seconds == 0 {
        errors.push("cache.lifetime_seconds must be greater than 0".to_string());
    }
    if cache.lifetime_seconds > MAX_TOKEN_LIFETIME_SECONDS {
        errors.push(format!(
            "cache.lifetime_seconds ({}) must not exceed {}",
            cache.lifetime_seconds, MAX_TOKEN_LIFETIME_SECONDS
        ));
    }
    if cache.safety_margin_seconds >= cache.lifetime_seconds {
        errors.push(format!(
            "cache.safety_margin_seconds ({}) must be lower than cache.lifetime_seconds ({})",
            cache.safety_margin_seconds, cache.lifetime_seconds
        ));
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.server.host.is_empty() {
        errors.push(format!(
            "settings.server.host '{}' must be valid",
            settings.server.host
        ));
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' must be an integer in range 0-65535",
            settings.server.port
        ));
    }

    if settings.http_timeout_ms == Some(0) {
        errors.push("settings.http_timeout_ms must be greater than 0".to_string());
    }

    // metrics endpoint start with '/'
    let metrics = &settings.metrics;
    if !metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            metrics.path
        ));
    }

    let idle = &settings.idle_shutdown;
    if idle.enabled && (idle.idle_minutes == 0 || idle.check_interval_seconds == 0) {
        errors.push(format!(
            "settings.idle_shutdown: idle_minutes ({}) and check_interval_seconds ({}) must be greater than 0",
            idle.idle_minutes, idle.check_interval_seconds
        ));
    }

    // logging level
    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }
}

/// STORE VALIDATION
fn validate_store(store: &StoreConfig, errors: &mut Vec<String>) {
    if store.kind == StoreKind::File && store.path.trim().is_empty() {
        errors.push("store.path is required for kind 'file'".to_string());
    }
}
