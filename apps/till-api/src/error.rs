//! # API Errors
//!
//! What HTTP clients see when a request fails.
//!
//! ```text
//! ┌──────────────────────────┬────────┬──────────────────────┐
//! │ Source                   │ Status │ code                 │
//! ├──────────────────────────┼────────┼──────────────────────┤
//! │ ValidationError          │ 400    │ VALIDATION_ERROR     │
//! │ SaleError::UnknownProduct│ 400    │ UNKNOWN_PRODUCT      │
//! │ SaleError::Insufficient… │ 400    │ INSUFFICIENT_STOCK   │
//! │ Conflict / duplicate     │ 409    │ CONFLICT             │
//! │ NotFound                 │ 404    │ NOT_FOUND            │
//! │ missing/bad token, login │ 401    │ UNAUTHORIZED         │
//! │ wrong role               │ 403    │ FORBIDDEN            │
//! │ any other store failure  │ 500    │ DATABASE_ERROR       │
//! └──────────────────────────┴────────┴──────────────────────┘
//! ```
//!
//! Store failures are logged with full detail and reported to the client
//! with a generic message.
//!
//! Sale failures that point at one basket line also carry `details`:
//!
//! ```json
//! {
//!   "success": false,
//!   "code": "INSUFFICIENT_STOCK",
//!   "message": "Insufficient stock for 7c1e…: available 2, requested 3",
//!   "details": { "product_id": "7c1e…", "available": 2, "requested": 3 }
//! }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use till_core::ValidationError;
use till_db::{DbError, SaleError};

/// Machine-readable error code in the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    UnknownProduct,
    InsufficientStock,
    Conflict,
    NotFound,
    Unauthorized,
    Forbidden,
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError
            | ErrorCode::UnknownProduct
            | ErrorCode::InsufficientStock => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Which product a sale failed on, and by how much.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetails {
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested: Option<i64>,
}

/// A failed request.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<ErrorDetails>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = Some(details);
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden() -> Self {
        Self::new(ErrorCode::Forbidden, "Insufficient permissions")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(%message, "Internal error");
        Self::new(ErrorCode::InternalError, "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    code: ErrorCode,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a ErrorDetails>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            code: self.code,
            message: &self.message,
            details: self.details.as_ref(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, .. } => ApiError::not_found(format!("{entity} not found")),
            DbError::UniqueViolation { field, value } => {
                let column = field.rsplit('.').next().unwrap_or(&field).to_string();
                ApiError::new(
                    ErrorCode::Conflict,
                    format!("A record with {column} '{value}' already exists"),
                )
            }
            DbError::ForeignKeyViolation { .. } => ApiError::new(
                ErrorCode::Conflict,
                "Record is referenced by other records",
            ),
            DbError::Conflict(_) => ApiError::new(
                ErrorCode::Conflict,
                "The database is busy, please retry",
            ),
            other => {
                error!(error = %other, "Database error");
                ApiError::new(ErrorCode::DatabaseError, "Database error")
            }
        }
    }
}

impl From<SaleError> for ApiError {
    fn from(err: SaleError) -> Self {
        let message = err.to_string();
        match err {
            SaleError::Validation(e) => e.into(),
            SaleError::UnknownProduct(product_id) => ApiError::new(ErrorCode::UnknownProduct, message)
                .with_details(ErrorDetails {
                    product_id,
                    available: None,
                    requested: None,
                }),
            SaleError::InsufficientStock {
                product_id,
                available,
                requested,
            } => ApiError::new(ErrorCode::InsufficientStock, message).with_details(ErrorDetails {
                product_id,
                available: Some(available),
                requested: Some(requested),
            }),
            SaleError::Conflict => ApiError::new(ErrorCode::Conflict, message),
            SaleError::Store(e) => e.into(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_error_mapping() {
        let err: ApiError = SaleError::InsufficientStock {
            product_id: "p-1".to_string(),
            available: 1,
            requested: 2,
        }
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.message.contains("p-1"));
        assert_eq!(
            err.details,
            Some(ErrorDetails {
                product_id: "p-1".to_string(),
                available: Some(1),
                requested: Some(2),
            })
        );

        let err: ApiError = SaleError::UnknownProduct("p-9".to_string()).into();
        assert_eq!(err.code, ErrorCode::UnknownProduct);
        assert_eq!(err.details.map(|d| d.product_id).as_deref(), Some("p-9"));

        let err: ApiError = SaleError::Conflict.into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_db_error_mapping() {
        let err: ApiError = DbError::duplicate("products.barcode", "123").into();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.message, "A record with barcode '123' already exists");

        let err: ApiError = DbError::not_found("Product", "p-1").into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = DbError::QueryFailed("disk I/O error".to_string()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, "Database error");
    }

    #[tokio::test]
    async fn test_details_in_envelope_only_when_present() {
        let response = ApiError::from(SaleError::InsufficientStock {
            product_id: "p-1".to_string(),
            available: 2,
            requested: 3,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["details"]["product_id"], "p-1");
        assert_eq!(body["details"]["available"], 2);
        assert_eq!(body["details"]["requested"], 3);

        let response = ApiError::not_found("Product not found").into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body.get("details").is_none());
    }

    #[test]
    fn test_error_code_wire_format() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::InsufficientStock).unwrap(),
            "\"INSUFFICIENT_STOCK\""
        );
    }
}
