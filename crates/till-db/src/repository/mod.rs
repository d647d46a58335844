//! # Repository Module
//!
//! Database repository implementations for Till.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.products().list(&filter)                                   │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── list(&self, filter)              ← pool-scoped reads/writes       │
//! │  ├── get_by_id(&self, id)                                              │
//! │  └── decrement_stock(conn, id, qty)   ← joins the caller's transaction │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Methods taking `&self` run on the pool. Associated functions taking   │
//! │  `&mut SqliteConnection` run inside a transaction the caller owns,     │
//! │  which is how the checkout keeps a sale all-or-nothing.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD, search, stock decrement
//! - [`SaleRepository`](sale::SaleRepository) - Sale and sale item operations
//! - [`DailySummaryRepository`](summary::DailySummaryRepository) - Per-date running totals
//! - [`UserRepository`](user::UserRepository) - Operator accounts
//! - [`AuditRepository`](audit::AuditRepository) - Append-only audit log
//! - [`DashboardRepository`](dashboard::DashboardRepository) - Back-office aggregates

pub mod audit;
pub mod dashboard;
pub mod product;
pub mod sale;
pub mod summary;
pub mod user;
