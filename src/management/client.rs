use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::cache::token_cache::TokenCache;
use crate::config::identity::IdentityConfig;
use crate::errors::{ConfigError, ManagementError};
use crate::helpers::time::get_instant;
use crate::management::models::{ChangePasswordPayload, CreateUserPayload, FavoritesMetadata, FavoritesPatch, User};
use crate::management::password::generate_temp_password;
use crate::observability::metrics::get_metrics;
use crate::utils::constants::USERS_PAGE_SIZE;

/// Typed wrapper around the identity provider's user-management endpoints.
/// Every authenticated call takes its bearer token from the shared `TokenCache`.
#[derive(Clone)]
pub struct ManagementClient {
    client: Client,
    tokens: Arc<TokenCache>,
    base_url: String,
    connection: String,
    web_client_id: Option<String>,
    redirect_uri: Option<String>,
}

impl ManagementClient {
    pub fn new(client: Client, tokens: Arc<TokenCache>, identity: &IdentityConfig) -> Self {
        Self {
            client,
            tokens,
            base_url: identity.base_url(),
            connection: identity.connection().to_owned(),
            web_client_id: identity.web_client_id.clone().filter(|id| !id.is_empty()),
            redirect_uri: identity.redirect_uri.clone().filter(|uri| !uri.is_empty()),
        }
    }

    pub fn tokens(&self) -> &Arc<TokenCache> {
        &self.tokens
    }

    /// Every user, paging with `per_page=50` until an empty page comes back.
    pub async fn list_users(&self) -> Result<Vec<User>, ManagementError> {
        let url = self.users_url();
        let mut users = Vec::new();
        let mut page: u32 = 0;
        loop {
            let request = self
                .authorized(self.client.get(&url))
                .await?
                .query(&[("page", page), ("per_page", USERS_PAGE_SIZE)]);
            let batch: Vec<User> = self.send_json("list_users", request).await?;
            if batch.is_empty() {
                break;
            }
            debug!("users page {} returned {} users", page, batch.len());
            users.extend(batch);
            page += 1;
        }
        info!("listed {} users", users.len());
        Ok(users)
    }

    /// First user matching `email`, if any.
    pub async fn find_user(&self, email: &str) -> Result<Option<User>, ManagementError> {
        let request = self
            .authorized(self.client.get(self.users_url()))
            .await?
            .query(&[("q", email)]);
        let users: Vec<User> = self.send_json("find_user", request).await?;
        Ok(users.into_iter().next())
    }

    pub async fn create_user(&self, email: &str, given_name: &str, family_name: &str) -> Result<User, ManagementError> {
        let payload = CreateUserPayload {
            email,
            given_name,
            family_name,
            connection: &self.connection,
            email_verified: true,
            password: generate_temp_password(),
        };
        let request = self
            .authorized(self.client.post(self.users_url()))
            .await?
            .json(&payload);
        let user: User = self.send_json("create_user", request).await?;
        info!("created user {}", user.user_id);
        Ok(user)
    }

    /// Password-change email through the public web client. No bearer token involved.
    pub async fn send_password_reset_email(&self, email: &str) -> Result<(), ManagementError> {
        let client_id = self
            .web_client_id
            .as_deref()
            .ok_or(ConfigError::Missing("identity.web_client_id"))?;

        let payload = ChangePasswordPayload {
            client_id,
            email,
            connection: &self.connection,
            redirect_uri: self.redirect_uri.as_deref(),
        };
        let request = self
            .client
            .post(format!("{}/dbconnections/change_password", self.base_url))
            .json(&payload);
        self.send("send_password_reset_email", request).await?;
        Ok(())
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<(), ManagementError> {
        let request = self.authorized(self.client.delete(user_url(&self.base_url, user_id)?)).await?;
        self.send("delete_user", request).await?;
        info!("deleted user {}", user_id);
        Ok(())
    }

    /// Replace `app_metadata.favorites` of the user registered under `email`.
    pub async fn update_user_favorites(&self, email: &str, favorites: &[String]) -> Result<User, ManagementError> {
        let user = self
            .find_user(email)
            .await?
            .ok_or_else(|| ManagementError::UserNotFound(email.to_owned()))?;

        let patch = FavoritesPatch {
            app_metadata: FavoritesMetadata { favorites },
        };
        let request = self
            .authorized(self.client.patch(user_url(&self.base_url, &user.user_id)?))
            .await?
            .json(&patch);
        self.send_json("update_user_favorites", request).await
    }

    fn users_url(&self) -> String {
        format!("{}/api/v2/users", self.base_url)
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ManagementError> {
        let token = self.tokens.get_token().await?;
        Ok(request.bearer_auth(token))
    }

    async fn send(&self, operation: &'static str, request: RequestBuilder) -> Result<Response, ManagementError> {
        let metrics = get_metrics().await;
        let start = get_instant();

        let result = match request.send().await {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                Err(ManagementError::Upstream { operation, status, body })
            }
            Err(source) => Err(ManagementError::Transport { operation, source }),
        };

        metrics
            .management_duration
            .with_label_values(&[operation])
            .observe(start.elapsed().as_secs_f64());
        let outcome = match &result {
            Ok(_) => "success",
            Err(err) => err.kind(),
        };
        metrics.management_requests.with_label_values(&[operation, outcome]).inc();
        result
    }

    async fn send_json<T: DeserializeOwned>(&self, operation: &'static str, request: RequestBuilder) -> Result<T, ManagementError> {
        let response = self.send(operation, request).await?;
        response.json::<T>().await.map_err(|e| ManagementError::Decode {
            operation,
            reason: e.to_string(),
        })
    }
}

/// `{base}/api/v2/users/{user_id}` with the id pushed as a single encoded segment.
fn user_url(base_url: &str, user_id: &str) -> Result<Url, ManagementError> {
    let invalid = || ConfigError::Invalid(vec![format!("identity base url '{}' cannot carry a path", base_url)]);
    let mut url = Url::parse(base_url).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .extend(["api", "v2", "users"])
        .push(user_id);
    Ok(url)
}
