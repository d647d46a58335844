//! `/api/dashboard`: back-office read models. All date windows are UTC.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiQuery;
use crate::{ApiResponse, AppState};
use till_core::{DashboardStats, PaymentBreakdown, Product, Sale};
use till_db::repository::dashboard::EXPIRY_WINDOW_DAYS;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/recent-sales", get(recent_sales))
        .route("/low-stock", get(low_stock))
        .route("/expiring", get(expiring))
        .route("/sales-by-payment", get(sales_by_payment))
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    /// Days back from today.
    pub period: Option<i64>,
}

async fn stats(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> ApiResult<Json<ApiResponse<DashboardStats>>> {
    let stats = state.db.dashboard().stats(Utc::now().date_naive()).await?;
    Ok(ApiResponse::ok(stats))
}

async fn recent_sales(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiQuery(query): ApiQuery<RecentQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Sale>>>> {
    let limit = query.limit.unwrap_or(10);
    if !(1..=100).contains(&limit) {
        return Err(ApiError::validation("limit must be between 1 and 100"));
    }

    let sales = state.db.sales().recent(limit).await?;
    Ok(ApiResponse::ok(sales))
}

async fn low_stock(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<Product>>>> {
    let products = state.db.dashboard().low_stock().await?;
    Ok(ApiResponse::ok(products))
}

async fn expiring(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<Product>>>> {
    let products = state
        .db
        .dashboard()
        .expiring(Utc::now().date_naive(), EXPIRY_WINDOW_DAYS)
        .await?;
    Ok(ApiResponse::ok(products))
}

async fn sales_by_payment(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiQuery(query): ApiQuery<PeriodQuery>,
) -> ApiResult<Json<ApiResponse<Vec<PaymentBreakdown>>>> {
    let period = query.period.unwrap_or(30);
    if !(1..=3650).contains(&period) {
        return Err(ApiError::validation("period must be between 1 and 3650 days"));
    }

    let since = Utc::now().date_naive() - Duration::days(period);
    let rows = state.db.dashboard().sales_by_payment(since).await?;
    Ok(ApiResponse::ok(rows))
}
