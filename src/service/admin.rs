use serde::Deserialize;
use tracing::info;

use crate::errors::ManagementError;
use crate::management::client::ManagementClient;
use crate::management::models::User;

#[derive(Debug, Clone, Deserialize)]
pub struct InviteUserRequest {
    pub email: String,
    pub given_name: String,
    pub family_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteUserRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateFavoritesRequest {
    pub email: String,
    pub favorites: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteOutcome {
    Invited { user_id: String },
    AlreadyExists { user_id: String },
}

impl InviteOutcome {
    pub fn user_id(&self) -> &str {
        match self {
            InviteOutcome::Invited { user_id } | InviteOutcome::AlreadyExists { user_id } => user_id,
        }
    }
}

/// Invite / list / delete / favorites workflows, shared by every surface.
#[derive(Clone)]
pub struct AdminService {
    management: ManagementClient,
}

impl AdminService {
    pub fn new(management: ManagementClient) -> Self {
        Self { management }
    }

    pub fn management(&self) -> &ManagementClient {
        &self.management
    }

    /// Create the account and send a password-change email, unless the email is already registered.
    pub async fn invite(&self, request: &InviteUserRequest) -> Result<InviteOutcome, ManagementError> {
        validate_email(&request.email)?;
        require_non_empty("given_name", &request.given_name)?;
        require_non_empty("family_name", &request.family_name)?;

        if let Some(user) = self.management.find_user(&request.email).await? {
            info!("invite skipped, user {} already exists", user.user_id);
            return Ok(InviteOutcome::AlreadyExists { user_id: user.user_id });
        }

        let user = self
            .management
            .create_user(&request.email, &request.given_name, &request.family_name)
            .await?;
        self.management.send_password_reset_email(&request.email).await?;
        info!("invitation sent to user {}", user.user_id);
        Ok(InviteOutcome::Invited { user_id: user.user_id })
    }

    pub async fn list(&self) -> Result<Vec<User>, ManagementError> {
        self.management.list_users().await
    }

    /// Returns the deleted user's id.
    pub async fn delete_by_email(&self, request: &DeleteUserRequest) -> Result<String, ManagementError> {
        validate_email(&request.email)?;
        let user = self
            .management
            .find_user(&request.email)
            .await?
            .ok_or_else(|| ManagementError::UserNotFound(request.email.clone()))?;
        self.management.delete_user(&user.user_id).await?;
        Ok(user.user_id)
    }

    pub async fn update_favorites(&self, request: &UpdateFavoritesRequest) -> Result<User, ManagementError> {
        validate_email(&request.email)?;
        self.management
            .update_user_favorites(&request.email, &request.favorites)
            .await
    }
}

/// `local@domain.tld`, no whitespace. Full RFC 5322 is the provider's problem.
pub fn validate_email(email: &str) -> Result<(), ManagementError> {
    let invalid = || ManagementError::InvalidRequest(format!("'{}' is not a valid email address", email));

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    let domain_ok = !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'));
    if local.is_empty() || !domain_ok {
        return Err(invalid());
    }
    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ManagementError> {
    if value.trim().is_empty() {
        return Err(ManagementError::InvalidRequest(format!("{} must not be empty", field)));
    }
    Ok(())
}
