use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::errors::ManagementError;

/// Envelope for every admin API response.
#[derive(Debug, Clone, Serialize)]
pub struct StandardResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl StandardResponse {
    pub fn ok(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

impl IntoResponse for StandardResponse {
    fn into_response(self) -> Response {
        let status = if self.success { StatusCode::OK } else { StatusCode::INTERNAL_SERVER_ERROR };
        (status, Json(self)).into_response()
    }
}

#[derive(Debug)]
pub struct ApiError(pub ManagementError);

impl From<ManagementError> for ApiError {
    fn from(err: ManagementError) -> Self {
        Self(err)
    }
}

pub fn status_for(err: &ManagementError) -> StatusCode {
    match err {
        ManagementError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        ManagementError::UserNotFound(_) => StatusCode::NOT_FOUND,
        ManagementError::Token(_) => StatusCode::SERVICE_UNAVAILABLE,
        ManagementError::Upstream { .. } | ManagementError::Transport { .. } | ManagementError::Decode { .. } => {
            StatusCode::BAD_GATEWAY
        }
        ManagementError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!("request failed: {}", self.0);
        } else {
            warn!("request rejected: {}", self.0);
        }
        (status, Json(StandardResponse::failure(self.0.to_string()))).into_response()
    }
}
