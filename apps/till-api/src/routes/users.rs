//! `/api/users`: operator accounts.

use axum::extract::{Path, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::{ApiResponse, AppState};
use till_core::{AuditAction, User, UserRole};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/profile", get(profile))
        .route("/:id/status", patch(update_status))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub is_active: bool,
}

async fn list_users(
    State(state): State<AppState>,
    caller: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<User>>>> {
    caller.require_role(&[UserRole::Admin, UserRole::Manager])?;
    let users = state.db.users().list().await?;
    Ok(ApiResponse::ok(users))
}

async fn profile(
    State(state): State<AppState>,
    caller: AuthUser,
) -> ApiResult<Json<ApiResponse<User>>> {
    let user = state
        .db
        .users()
        .get_by_id(&caller.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::ok(user))
}

async fn update_status(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<StatusRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    caller.require_role(&[UserRole::Admin])?;

    if id == caller.id && !req.is_active {
        return Err(ApiError::validation("You cannot deactivate your own account"));
    }

    state.db.users().set_active(&id, req.is_active).await?;

    state
        .db
        .audit()
        .record_best_effort(&caller.id, AuditAction::UpdateUserStatus, Some("users"), Some(&id))
        .await;

    info!(user_id = %id, is_active = req.is_active, "User status updated");

    Ok(ApiResponse::message("User status updated successfully"))
}
