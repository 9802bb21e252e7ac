use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::identity::IdentityConfig;
use crate::errors::TokenError;
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;

/// Third tier: something that can mint a fresh bearer token.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue(&self) -> Result<String, TokenError>;
}

#[derive(Serialize)]
struct ClientCredentialsRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    audience: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// `POST {base}/oauth/token` with a JSON client-credentials grant.
#[derive(Clone)]
pub struct ClientCredentialsIssuer {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    audience: String,
}

impl std::fmt::Debug for ClientCredentialsIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentialsIssuer")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

impl ClientCredentialsIssuer {
    pub fn new(client: Client, identity: &IdentityConfig) -> Self {
        Self {
            client,
            token_url: identity.token_url(),
            client_id: identity.client_id.clone(),
            client_secret: identity.client_secret.clone(),
            audience: identity.audience(),
        }
    }

    async fn request_token(&self) -> Result<String, TokenError> {
        let unavailable = |msg: String| TokenError::CredentialUnavailable(msg);

        let response = self
            .client
            .post(&self.token_url)
            .json(&ClientCredentialsRequest {
                grant_type: "client_credentials",
                client_id: &self.client_id,
                client_secret: &self.client_secret,
                audience: &self.audience,
            })
            .send()
            .await
            .map_err(|e| unavailable(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("token endpoint returned {}", status)));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| unavailable(format!("token response is not valid JSON: {}", e)))?;

        body.access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| unavailable("token response has no access_token".to_owned()))
    }
}

#[async_trait]
impl TokenIssuer for ClientCredentialsIssuer {
    async fn issue(&self) -> Result<String, TokenError> {
        let metrics = get_metrics().await;
        let start = get_instant();
        debug!("requesting client-credentials token from {}", self.token_url);

        let result = self.request_token().await;
        let outcome = if result.is_ok() { "success" } else { "failure" };
        metrics
            .token_issuance_duration
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());

        if let Err(err) = &result {
            metrics.token_issuance_failures.inc();
            warn!("token issuance failed: {}", err);
        }
        result
    }
}

/// Shared reqwest client; every call is bounded by `timeout_ms`.
pub fn build_http_client(timeout_ms: u64) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
}
