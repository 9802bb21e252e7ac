//! Typed error boundaries. Startup and CLI glue use `anyhow` on top of these.

use thiserror::Error;

/// Raised only when every token tier is exhausted.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("credential unavailable: {0}")]
    CredentialUnavailable(String),
}

/// Durable parameter store failure. "Not found" is not an error: `get` returns `None`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("parameter store unavailable for '{key}': {reason}")]
    Unavailable { key: String, reason: String },
    #[error("parameter '{key}' exists and overwrite is disabled")]
    AlreadyExists { key: String },
    #[error("parameter store i/o on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parameter store payload for '{key}' is malformed: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("parameter store payload for '{key}' is implausible: {reason}")]
    Implausible { key: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required setting '{0}' is not set")]
    Missing(&'static str),
    #[error("config is not valid: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

#[derive(Debug, Error)]
pub enum ManagementError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("user with email {0} not found")]
    UserNotFound(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("identity provider returned {status} for {operation}: {body}")]
    Upstream {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("identity provider request for {operation} failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("identity provider response for {operation} is malformed: {reason}")]
    Decode {
        operation: &'static str,
        reason: String,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ManagementError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ManagementError::Token(_) => "credential_unavailable",
            ManagementError::UserNotFound(_) => "not_found",
            ManagementError::InvalidRequest(_) => "invalid_request",
            ManagementError::Upstream { .. } => "upstream_status",
            ManagementError::Transport { .. } => "transport",
            ManagementError::Decode { .. } => "decode",
            ManagementError::Config(_) => "config",
        }
    }
}
