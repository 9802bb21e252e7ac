use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::server::response::{ApiError, StandardResponse};
use crate::server::server::AppState;
use crate::service::admin::{DeleteUserRequest, InviteOutcome, InviteUserRequest, UpdateFavoritesRequest};

pub async fn list_users(State(state): State<AppState>) -> Result<StandardResponse, ApiError> {
    let users = state.admin.list().await?;
    Ok(StandardResponse::ok(
        "Users listed successfully",
        Some(json!({ "users": users })),
    ))
}

pub async fn invite_user(
    State(state): State<AppState>,
    Json(payload): Json<InviteUserRequest>,
) -> Result<StandardResponse, ApiError> {
    let outcome = state.admin.invite(&payload).await?;
    let message = match outcome {
        InviteOutcome::Invited { .. } => "User invited successfully",
        InviteOutcome::AlreadyExists { .. } => "User already exists",
    };
    Ok(StandardResponse::ok(message, Some(json!({ "user_id": outcome.user_id() }))))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Json(payload): Json<DeleteUserRequest>,
) -> Result<StandardResponse, ApiError> {
    let user_id = state.admin.delete_by_email(&payload).await?;
    Ok(StandardResponse::ok(
        "User deleted successfully",
        Some(json!({ "user_id": user_id })),
    ))
}

pub async fn update_favorites(
    State(state): State<AppState>,
    Json(payload): Json<UpdateFavoritesRequest>,
) -> Result<StandardResponse, ApiError> {
    let user = state.admin.update_favorites(&payload).await?;
    Ok(StandardResponse::ok(
        "Favorites updated successfully",
        Some(json!({ "user": user })),
    ))
}

pub async fn healthz() -> StandardResponse {
    StandardResponse::ok("ok", None)
}
