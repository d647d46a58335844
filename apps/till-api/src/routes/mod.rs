//! HTTP route handlers, one module per resource.
//!
//! Each module exposes `router() -> Router<AppState>`, nested under
//! `/api/<resource>` by [`crate::router`].

pub mod audit;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod products;
pub mod sales;
pub mod users;
