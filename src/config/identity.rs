use serde::Deserialize;

use crate::utils::constants::DEFAULT_CONNECTION;

/// ================================
/// Identity provider
/// ================================
/// Empty strings count as unset, so `${VAR}` expansion of a missing variable
/// can still be filled in by credential injection.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct IdentityConfig {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// defaults to `https://{domain}/api/v2/`
    pub audience: Option<String>,
    /// public web client used for password-change emails
    pub web_client_id: Option<String>,
    pub connection: Option<String>,
    pub redirect_uri: Option<String>,
    /// parameter holding a JSON object of credentials injected at startup
    pub credentials_parameter: Option<String>,
    /// overrides `https://{domain}`, e.g. a local mock
    pub base_url: Option<String>,
}

impl IdentityConfig {
    pub fn base_url(&self) -> String {
        self.base_url
            .as_ref()
            .filter(|url| !url.is_empty())
            .map(|url| url.trim_end_matches('/').to_owned())
            .unwrap_or_else(|| format!("https://{}", self.domain))
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.base_url())
    }

    pub fn audience(&self) -> String {
        self.audience
            .as_ref()
            .filter(|audience| !audience.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("https://{}/api/v2/", self.domain))
    }

    pub fn connection(&self) -> &str {
        self.connection
            .as_deref()
            .filter(|connection| !connection.is_empty())
            .unwrap_or(DEFAULT_CONNECTION)
    }
}
