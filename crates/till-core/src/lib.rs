//! # till-core: Pure Business Logic for Till
//!
//! Domain types and rules for the supermarket till. No I/O lives here; the
//! database crate and HTTP layer call into these functions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Till Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    till-api (axum)                              │   │
//! │  │   /api/auth  /api/products  /api/sales  /api/audit  ...         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    till-db (SQLite)                             │   │
//! │  │   repositories, checkout transaction, migrations               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   sale    │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ plan_sale │  │   rules   │  │   │
//! │  │   │   Sale    │  │  (cents)  │  │ SalePlan  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, DailySummary, AuditEntry, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`sale`] - Basket planning: stock checks and exact totals
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::money::Money;
//!
//! let price = Money::from_cents(150); // 1.50
//! let line_total = price.checked_multiply_quantity(3);
//! assert_eq!(line_total, Some(Money::from_cents(450)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use sale::{plan_sale, PlannedLine, SalePlan};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines accepted in a single basket.
///
/// Keeps a single sale transaction bounded in size.
pub const MAX_BASKET_LINES: usize = 100;

/// Maximum quantity on a single basket line.
///
/// Catches typos at the till (1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
