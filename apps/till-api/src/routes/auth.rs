//! `/api/auth`: login, account creation, logout.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::{ApiResponse, AppState};
use till_core::validation::{validate_email, validate_password, validate_user_name};
use till_core::{AuditAction, User, UserRole};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/logout", post(logout))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

/// Same message for unknown email, wrong password and inactive account.
const BAD_CREDENTIALS: &str = "Invalid email or password";

async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    validate_email(&req.email)?;
    if req.password.is_empty() {
        return Err(ApiError::validation("password is required"));
    }

    let user = state
        .db
        .users()
        .get_by_email(&req.email)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::unauthorized(BAD_CREDENTIALS))?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::unauthorized(BAD_CREDENTIALS));
    }

    let (token, expires_at) = state.jwt.issue(&user)?;

    state
        .db
        .audit()
        .record_best_effort(&user.id, AuditAction::Login, Some("users"), None)
        .await;

    info!(user_id = %user.id, role = %user.role, "User logged in");

    Ok(ApiResponse::ok_with_message(
        LoginResponse {
            user,
            token,
            expires_at,
        },
        "Login successful",
    ))
}

/// Creates an operator account. Admin only: cashiers and managers are
/// provisioned by an admin, never self-registered, and the first admin comes
/// from the startup bootstrap.
async fn register(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<User>>)> {
    caller.require_role(&[UserRole::Admin])?;

    validate_user_name(&req.name)?;
    validate_email(&req.email)?;
    validate_password(&req.password)?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        email: req.email.trim().to_lowercase(),
        password_hash: hash_password(&req.password)?,
        role: req.role,
        avatar: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.db.users().insert(&user).await?;

    state
        .db
        .audit()
        .record_best_effort(&caller.id, AuditAction::CreateUser, Some("users"), Some(&user.id))
        .await;

    info!(user_id = %user.id, role = %user.role, created_by = %caller.id, "User registered");

    Ok(ApiResponse::created(user, "User registered successfully"))
}

/// Tokens are stateless; the client discards its copy.
async fn logout(_caller: AuthUser) -> Json<ApiResponse<()>> {
    ApiResponse::message("Logged out successfully")
}
