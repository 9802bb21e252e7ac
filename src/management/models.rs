use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity-provider user profile. Only `user_id` and `email` are read here,
/// everything else is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateUserPayload<'a> {
    pub email: &'a str,
    pub given_name: &'a str,
    pub family_name: &'a str,
    pub connection: &'a str,
    pub email_verified: bool,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChangePasswordPayload<'a> {
    pub client_id: &'a str,
    pub email: &'a str,
    pub connection: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FavoritesPatch<'a> {
    pub app_metadata: FavoritesMetadata<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FavoritesMetadata<'a> {
    pub favorites: &'a [String],
}
