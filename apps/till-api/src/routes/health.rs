use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::{ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: bool,
    pub version: &'static str,
}

/// Liveness plus a trivial database query. 503 when the database is down.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<HealthStatus>>) {
    let database = state.db.health_check().await;
    let (code, status) = if database {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "DEGRADED")
    };

    (
        code,
        ApiResponse::ok(HealthStatus {
            status,
            database,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
