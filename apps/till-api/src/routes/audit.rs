//! `/api/audit`: the audit log (admin only).

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::ApiQuery;
use crate::{ApiResponse, AppState};
use till_core::validation::parse_date;
use till_core::{AuditPage, UserRole};
use till_db::repository::audit::DEFAULT_AUDIT_PAGE_SIZE;
use till_db::AuditFilter;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_audit))
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub user_id: Option<String>,
    pub action: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

async fn list_audit(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiQuery(query): ApiQuery<AuditQuery>,
) -> ApiResult<Json<ApiResponse<AuditPage>>> {
    caller.require_role(&[UserRole::Admin])?;

    let filter = AuditFilter {
        limit: query.limit.unwrap_or(DEFAULT_AUDIT_PAGE_SIZE),
        offset: query.offset.unwrap_or(0),
        user_id: query.user_id.filter(|s| !s.trim().is_empty()),
        action: query.action.filter(|s| !s.trim().is_empty()),
        start_date: query
            .start_date
            .as_deref()
            .map(|d| parse_date("start_date", d))
            .transpose()?,
        end_date: query
            .end_date
            .as_deref()
            .map(|d| parse_date("end_date", d))
            .transpose()?,
    };

    let page = state.db.audit().list(&filter).await?;
    Ok(ApiResponse::ok(page))
}
