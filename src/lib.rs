//! # Identity Admin Library
//!
//! Proxies user-management operations to an identity provider, authenticating
//! with a machine-to-machine token served from a three-tier read-through cache
//! (process memory, durable parameter store, token issuer).
//!
//! Modules:
//! - `cache`: the tiered M2M token cache
//! - `store`: durable parameter stores (SSM, file, memory)
//! - `sources`: client-credentials token issuer
//! - `management`: identity-provider user-management client
//! - `service`: invite / list / delete / favorites workflows
//! - `server`: HTTP admin API with CORS and idle shutdown
//! - `lambda`: API-Gateway proxy request/response adapter
//! - `config`: YAML configuration, validation and credential injection

pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod errors;
pub mod helpers;
pub mod lambda;
pub mod management;
pub mod observability;
pub mod server;
pub mod service;
pub mod sources;
pub mod store;
#[cfg(test)]
mod tests;
pub mod utils;

pub use crate::cache::token_cache::TokenCache;
pub use crate::config::service::ServiceConfig;
pub use crate::errors::{ConfigError, ManagementError, StoreError, TokenError};
