//! # till-db: Database Layer for Till
//!
//! SQLite storage for the Till point-of-sale backend, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Till Data Flow                                 │
//! │                                                                         │
//! │  HTTP handler (POST /api/sales)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     till-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌──────────────┐    │   │
//! │  │   │   Database    │   │   Checkout     │   │  Migrations  │    │   │
//! │  │   │   (pool.rs)   │   │ (checkout.rs)  │   │  (embedded)  │    │   │
//! │  │   │               │   │                │   │              │    │   │
//! │  │   │ SqlitePool    │◄──│ one tx / sale  │   │ 001_initial  │    │   │
//! │  │   │ WAL, busy     │   │ retries        │   │              │    │   │
//! │  │   └───────────────┘   └───────┬────────┘   └──────────────┘    │   │
//! │  │           ▲                   │                                 │   │
//! │  │           │           ┌───────▼────────────────────────────┐   │   │
//! │  │           └───────────│ Repositories                       │   │   │
//! │  │                       │ product, sale, summary, user,      │   │   │
//! │  │                       │ audit, dashboard                   │   │   │
//! │  │                       └────────────────────────────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (till.db)                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`checkout`] - The atomic sale-creation transaction
//!
//! ## Usage
//!
//! ```rust,ignore
//! use till_db::{CheckoutConfig, CreateSale, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("till.db")).await?;
//!
//! let receipt = db
//!     .checkout(CheckoutConfig::default())
//!     .create_sale(CreateSale { cashier_id, items, payment_method, customer })
//!     .await?;
//!
//! let today = db.summaries().get_for_date(Utc::now().date_naive()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{Checkout, CheckoutConfig, CreateSale, SaleError};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::audit::{AuditFilter, AuditRepository};
pub use repository::dashboard::DashboardRepository;
pub use repository::product::{ProductFilter, ProductRepository};
pub use repository::sale::{SaleFilter, SaleRepository};
pub use repository::summary::DailySummaryRepository;
pub use repository::user::UserRepository;
