//! # Till API
//!
//! HTTP JSON server for the Till supermarket point of sale.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Till API Routes                               │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  /api/auth     │  │  /api/products │  │  /api/sales                ││
//! │  │ • login        │  │ • list/search  │  │ • create (Checkout)        ││
//! │  │ • register     │  │ • get          │  │ • list / get               ││
//! │  │ • logout       │  │ • create/update│  │ • summary/daily            ││
//! │  └────────────────┘  │ • delete       │  └────────────────────────────┘│
//! │                      └────────────────┘                                │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  /api/users    │  │  /api/audit    │  │  /api/dashboard            ││
//! │  │ • list         │  │ • paginated    │  │ • stats, recent-sales      ││
//! │  │ • profile      │  │   log          │  │ • low-stock, expiring      ││
//! │  │ • status       │  │                │  │ • sales-by-payment         ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  Every response: { "success": bool, "data"?, "message"?, "code"? }     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]. Environment variables:
//! - `TILL_PORT` - HTTP port (default: 5000)
//! - `TILL_DATABASE_PATH` - SQLite file (default: till.db)
//! - `TILL_JWT_SECRET` - Secret for JWT signing
//! - `TILL_ADMIN_EMAIL` / `TILL_ADMIN_PASSWORD` - bootstrap admin

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::JwtManager;
use till_db::{Checkout, Database};

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};

/// Shared application state. Cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub checkout: Checkout,
}

impl AppState {
    pub fn new(db: Database, config: &ApiConfig) -> Self {
        AppState {
            jwt: JwtManager::new(&config.jwt_secret, config.jwt_ttl_hours),
            checkout: db.checkout(config.checkout_config()),
            db,
        }
    }
}

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(ApiResponse {
            success: true,
            data: Some(data),
            message: None,
        })
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Json<Self> {
        Json(ApiResponse {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        })
    }

    /// 201 with the created resource.
    pub fn created(data: T, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (StatusCode::CREATED, Self::ok_with_message(data, message))
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(ApiResponse {
            success: true,
            data: None,
            message: Some(message.into()),
        })
    }
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health::health))
        .nest("/api/auth", routes::auth::router())
        .nest("/api/users", routes::users::router())
        .nest("/api/products", routes::products::router())
        .nest("/api/sales", routes::sales::router())
        .nest("/api/audit", routes::audit::router())
        .nest("/api/dashboard", routes::dashboard::router())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    ApiError::not_found("Route not found")
}
