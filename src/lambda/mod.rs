//! API-Gateway proxy shape adapter.
//!
//! Translates `{httpMethod, path, body}` events into calls on [`AdminService`]
//! and wraps results as `{statusCode, headers, body}`. Only the shapes live
//! here; the function runtime that delivers events is outside this crate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::errors::ManagementError;
use crate::service::admin::{AdminService, DeleteUserRequest, InviteOutcome, InviteUserRequest};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    #[serde(default)]
    pub http_method: String,
    #[serde(default)]
    pub path: String,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ProxyResponse {
    pub fn json(status_code: u16, body: &Value) -> Self {
        let headers = BTreeMap::from([
            ("Content-Type".to_owned(), "application/json".to_owned()),
            ("Access-Control-Allow-Origin".to_owned(), "*".to_owned()),
            ("Access-Control-Allow-Headers".to_owned(), "Content-Type,Authorization".to_owned()),
            ("Access-Control-Allow-Methods".to_owned(), "GET,POST,DELETE,OPTIONS".to_owned()),
        ]);
        Self {
            status_code,
            headers,
            body: body.to_string(),
        }
    }

    fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self::json(status_code, &json!({ "error": message.into() }))
    }

    pub fn body_json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

/// Route one proxy event. Unknown routes are 404, anything unexpected is 500.
pub async fn handle_event(admin: &AdminService, event: ProxyRequest) -> ProxyResponse {
    info!("proxy event {} {}", event.http_method, event.path);
    let result = match (event.http_method.to_uppercase().as_str(), event.path.as_str()) {
        ("GET", "/users") => list_users(admin).await,
        ("POST", "/users") => invite_user(admin, event.body.as_deref()).await,
        ("DELETE", "/users") => delete_user_by_email(admin, event.body.as_deref()).await,
        ("OPTIONS", _) => Ok(ProxyResponse::json(200, &json!({}))),
        _ => Ok(ProxyResponse::error(404, "Not found")),
    };

    result.unwrap_or_else(|err| {
        error!("proxy event failed: {}", err);
        ProxyResponse::error(500, err.to_string())
    })
}

/// Standalone list handler: every user as a bare JSON array.
pub async fn list_users_handler(admin: &AdminService) -> ProxyResponse {
    list_users(admin).await.unwrap_or_else(|err| {
        error!("list users failed: {}", err);
        ProxyResponse::error(500, err.to_string())
    })
}

async fn list_users(admin: &AdminService) -> Result<ProxyResponse, ManagementError> {
    let users = admin.list().await?;
    Ok(ProxyResponse::json(200, &json!(users)))
}

async fn invite_user(admin: &AdminService, body: Option<&str>) -> Result<ProxyResponse, ManagementError> {
    let data = parse_body(body);
    let field = |name: &str| data.get(name).and_then(Value::as_str).map(str::to_owned);
    let (Some(email), Some(given_name), Some(family_name)) = (field("email"), field("given_name"), field("family_name"))
    else {
        return Ok(ProxyResponse::error(400, "Missing required fields"));
    };

    let request = InviteUserRequest {
        email,
        given_name,
        family_name,
    };
    match admin.invite(&request).await {
        Ok(InviteOutcome::Invited { user_id }) => Ok(ProxyResponse::json(
            201,
            &json!({ "message": "User invited", "user_id": user_id }),
        )),
        Ok(InviteOutcome::AlreadyExists { user_id }) => Ok(ProxyResponse::json(
            200,
            &json!({ "message": "User already exists", "user_id": user_id }),
        )),
        Err(ManagementError::InvalidRequest(msg)) => Ok(ProxyResponse::error(400, msg)),
        Err(err) => Err(err),
    }
}

async fn delete_user_by_email(admin: &AdminService, body: Option<&str>) -> Result<ProxyResponse, ManagementError> {
    let data = parse_body(body);
    let Some(email) = data.get("email").and_then(Value::as_str).filter(|e| !e.is_empty()) else {
        return Ok(ProxyResponse::error(400, "Missing email"));
    };

    let request = DeleteUserRequest { email: email.to_owned() };
    match admin.delete_by_email(&request).await {
        Ok(_) => Ok(ProxyResponse::json(200, &json!({ "message": format!("User {} deleted", email) }))),
        Err(ManagementError::UserNotFound(_)) => Ok(ProxyResponse::error(404, "User not found")),
        Err(ManagementError::InvalidRequest(msg)) => Ok(ProxyResponse::error(400, msg)),
        Err(err) => Err(err),
    }
}

/// Missing or non-JSON bodies read as `{}`.
fn parse_body(body: Option<&str>) -> Value {
    body.filter(|b| !b.trim().is_empty())
        .and_then(|b| serde_json::from_str::<Value>(b).ok())
        .filter(Value::is_object)
        .unwrap_or_else(|| json!({}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_uses_api_gateway_field_names() {
        let event: ProxyRequest =
            serde_json::from_value(json!({"httpMethod": "POST", "path": "/users", "body": "{}"})).unwrap();
        assert_eq!(event.http_method, "POST");
        assert_eq!(event.body.as_deref(), Some("{}"));

        let response = serde_json::to_value(ProxyResponse::json(200, &json!({"a": 1}))).unwrap();
        assert_eq!(response["statusCode"], json!(200));
        assert_eq!(response["headers"]["Content-Type"], json!("application/json"));
        assert_eq!(response["body"], json!("{\"a\":1}"));
    }

    #[test]
    fn bad_bodies_become_empty_objects() {
        assert_eq!(parse_body(None), json!({}));
        assert_eq!(parse_body(Some("not json")), json!({}));
        assert_eq!(parse_body(Some("[1,2]")), json!({}));
        assert_eq!(parse_body(Some(r#"{"email":"a@b.co"}"#))["email"], json!("a@b.co"));
    }
}
