//! `/api/sales`: ringing up sales and reading them back.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::{ApiResponse, AppState};
use till_core::validation::parse_date;
use till_core::{BasketLine, CustomerInfo, DailySummary, PaymentMethod, Sale, SaleReceipt, SaleWithItems};
use till_db::{CreateSale, SaleFilter};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sales).post(create_sale))
        .route("/summary/daily", get(daily_summary))
        .route("/:id", get(get_sale))
}

/// Body of `POST /api/sales`.
///
/// ```json
/// {
///   "items": [{ "product_id": "…", "quantity": 3 }],
///   "payment_method": "cash",
///   "customer_name": "Nakato",
///   "notes": "loyalty card forgotten"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    pub items: Vec<BasketLine>,
    pub payment_method: PaymentMethod,
    #[serde(flatten)]
    pub customer: CustomerInfo,
}

#[derive(Debug, Default, Deserialize)]
pub struct SaleQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub cashier_id: Option<String>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub date: Option<String>,
}

async fn create_sale(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(req): ApiJson<CreateSaleRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SaleReceipt>>)> {
    let receipt = state
        .checkout
        .create_sale(CreateSale {
            cashier_id: caller.id,
            items: req.items,
            payment_method: req.payment_method,
            customer: req.customer,
        })
        .await?;

    Ok(ApiResponse::created(receipt, "Sale completed successfully"))
}

async fn list_sales(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiQuery(query): ApiQuery<SaleQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Sale>>>> {
    let filter = SaleFilter {
        start_date: non_empty(&query.start_date)
            .map(|d| parse_date("start_date", d))
            .transpose()?,
        end_date: non_empty(&query.end_date)
            .map(|d| parse_date("end_date", d))
            .transpose()?,
        cashier_id: non_empty(&query.cashier_id).map(str::to_string),
        payment_method: non_empty(&query.payment_method)
            .map(str::parse::<PaymentMethod>)
            .transpose()?,
    };

    if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
        if start > end {
            return Err(ApiError::validation("start_date must not be after end_date"));
        }
    }

    let sales = state.db.sales().list(&filter).await?;
    Ok(ApiResponse::ok(sales))
}

async fn get_sale(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<SaleWithItems>>> {
    let sale = state
        .db
        .sales()
        .get_with_items(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale not found"))?;
    Ok(ApiResponse::ok(sale))
}

/// Totals for `?date=YYYY-MM-DD`, today (UTC) when omitted.
async fn daily_summary(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiQuery(query): ApiQuery<SummaryQuery>,
) -> ApiResult<Json<ApiResponse<DailySummary>>> {
    let date = match non_empty(&query.date) {
        Some(d) => parse_date("date", d)?,
        None => Utc::now().date_naive(),
    };

    let summary = state.db.summaries().get_for_date(date).await?;
    Ok(ApiResponse::ok(summary))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
