//! Shared constants and invariants

pub const DEFAULT_SAFETY_MARGIN_SECS: u64 = 60;
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 24 * 60 * 60;
pub const MAX_TOKEN_LIFETIME_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;

/// Durable-tier key for the M2M token blob. Fixed, not derived from configuration.
pub const TOKEN_CACHE_PARAMETER_PATH: &str = "/idp-admin/m2m-token-cache";

pub const DEFAULT_CONNECTION: &str = "Username-Password-Authentication";
pub const DEFAULT_CONFIG_PATH: &str = "idp-admin.yaml";
pub const DEFAULT_FILE_STORE_PATH: &str = ".idp-admin/parameters.json";

pub const USERS_PAGE_SIZE: u32 = 50;
pub const TEMP_PASSWORD_LENGTH: usize = 16;
