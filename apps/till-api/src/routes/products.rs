//! `/api/products`: the catalog.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::extract::{ApiJson, ApiQuery};
use crate::{ApiResponse, AppState};
use till_core::validation::{validate_product_input, validate_search_query};
use till_core::{AuditAction, Product, ProductInput, UserRole};
use till_db::repository::product::generate_product_id;
use till_db::{DbError, ProductFilter};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub low_stock: bool,
}

async fn list_products(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Product>>>> {
    let search = match query.search.as_deref() {
        Some(s) => Some(validate_search_query(s)?).filter(|s| !s.is_empty()),
        None => None,
    };
    let category = query
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let filter = ProductFilter {
        search,
        category,
        low_stock: query.low_stock,
    };
    let products = state.db.products().list(&filter).await?;
    Ok(ApiResponse::ok(products))
}

async fn get_product(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Product>>> {
    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    Ok(ApiResponse::ok(product))
}

async fn create_product(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Product>>)> {
    caller.require_role(&[UserRole::Admin, UserRole::Manager])?;
    validate_product_input(&input)?;

    let product = input.into_product(generate_product_id(), Utc::now());
    let product = state.db.products().insert(&product).await?;

    state
        .db
        .audit()
        .record_best_effort(&caller.id, AuditAction::CreateProduct, Some("products"), Some(&product.id))
        .await;

    info!(product_id = %product.id, barcode = %product.barcode, "Product created");

    Ok(ApiResponse::created(product, "Product created successfully"))
}

async fn update_product(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<Json<ApiResponse<Product>>> {
    caller.require_role(&[UserRole::Admin, UserRole::Manager])?;
    validate_product_input(&input)?;

    let existing = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    let mut product = input.into_product(existing.id, Utc::now());
    product.created_at = existing.created_at;
    let product = state.db.products().update(&product).await?;

    state
        .db
        .audit()
        .record_best_effort(&caller.id, AuditAction::UpdateProduct, Some("products"), Some(&product.id))
        .await;

    info!(product_id = %product.id, "Product updated");

    Ok(ApiResponse::ok_with_message(product, "Product updated successfully"))
}

async fn delete_product(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    caller.require_role(&[UserRole::Admin])?;

    state.db.products().delete(&id).await.map_err(|e| match e {
        DbError::ForeignKeyViolation { .. } => ApiError::new(
            ErrorCode::Conflict,
            "Product has sales history and cannot be deleted",
        ),
        other => other.into(),
    })?;

    state
        .db
        .audit()
        .record_best_effort(&caller.id, AuditAction::DeleteProduct, Some("products"), Some(&id))
        .await;

    info!(product_id = %id, "Product deleted");

    Ok(ApiResponse::message("Product deleted successfully"))
}
