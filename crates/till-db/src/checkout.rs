//! # Checkout
//!
//! The sale-creation transaction: one basket in, one committed sale out,
//! or nothing at all.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        create_sale(request)                             │
//! │                                                                         │
//! │  validate_basket ──✗──► SaleError::Validation   (no store access)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌── attempt ────────────────────────────────────────────────────────┐ │
//! │  │ read catalog snapshot → plan_sale (prices, cumulative stock)      │ │
//! │  │                                                                    │ │
//! │  │ BEGIN                                                              │ │
//! │  │ ├── INSERT sale            ← first statement takes the write lock │ │
//! │  │ ├── for each line:                                                 │ │
//! │  │ │     UPDATE stock WHERE stock >= qty   (0 rows → Insufficient)   │ │
//! │  │ │     INSERT sale_item                                             │ │
//! │  │ ├── UPSERT daily_sales_summary                                    │ │
//! │  │ COMMIT                    (any early return drops tx → ROLLBACK)  │ │
//! │  └────────────────────────────────────────────────────────────────────┘ │
//! │       │                                                                 │
//! │       ├── duplicate receipt → new receipt number, retry (bounded)      │
//! │       ├── lock conflict     → sleep backoff × n, retry (bounded)       │
//! │       ▼                                                                 │
//! │  audit CREATE_SALE (best effort, after commit)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SaleReceipt { sale_id, receipt_number, total_cents }                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! SQLite has one write lock per database. Because the sale row is the
//! first write, two checkouts serialize on it; the loser waits up to the
//! pool's busy timeout. The conditional stock decrement re-checks stock
//! under the lock, so two sales racing for the last unit cannot both win
//! even when both planned against the same snapshot.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::audit::AuditRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sale::{generate_sale_id, generate_sale_item_id, SaleRepository};
use crate::repository::summary::DailySummaryRepository;
use till_core::validation::validate_basket;
use till_core::{
    plan_sale, AuditAction, BasketLine, CoreError, CustomerInfo, PaymentMethod, Sale, SaleItem,
    SalePlan, SaleReceipt, ValidationError,
};

// =============================================================================
// Configuration
// =============================================================================

/// Retry bounds for [`Checkout::create_sale`].
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Extra attempts after a lock conflict before giving up.
    /// Default: 3
    pub max_conflict_retries: u32,

    /// Extra attempts after a receipt-number collision.
    /// Default: 5
    pub max_receipt_retries: u32,

    /// Base delay between conflict retries; attempt `n` sleeps `n × backoff`.
    /// Default: 25ms
    pub retry_backoff: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        CheckoutConfig {
            max_conflict_retries: 3,
            max_receipt_retries: 5,
            retry_backoff: Duration::from_millis(25),
        }
    }
}

// =============================================================================
// Request / Errors
// =============================================================================

/// Everything needed to ring up one sale.
#[derive(Debug, Clone)]
pub struct CreateSale {
    pub cashier_id: String,
    pub items: Vec<BasketLine>,
    pub payment_method: PaymentMethod,
    pub customer: CustomerInfo,
}

/// Why a sale was not created. In every case nothing was persisted.
#[derive(Debug, Error)]
pub enum SaleError {
    #[error("Validation error: {0}")]
    Validation(ValidationError),

    #[error("Product not found: {0}")]
    UnknownProduct(String),

    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Lock contention outlasted every retry.
    #[error("Sale could not be completed due to concurrent activity, please retry")]
    Conflict,

    #[error("Store error: {0}")]
    Store(DbError),
}

impl From<ValidationError> for SaleError {
    fn from(err: ValidationError) -> Self {
        SaleError::Validation(err)
    }
}

impl From<CoreError> for SaleError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownProduct(id) => SaleError::UnknownProduct(id),
            CoreError::InsufficientStock {
                product_id,
                available,
                requested,
            } => SaleError::InsufficientStock {
                product_id,
                available,
                requested,
            },
            CoreError::AmountOverflow { context } => {
                SaleError::Validation(ValidationError::InvalidFormat {
                    field: "items".to_string(),
                    reason: format!("{context} exceeds the representable amount"),
                })
            }
            CoreError::Validation(e) => SaleError::Validation(e),
        }
    }
}

impl From<DbError> for SaleError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict(_) => SaleError::Conflict,
            other => SaleError::Store(other),
        }
    }
}

/// Outcome of a single attempt. Receipt collisions never leave this module.
enum AttemptError {
    DuplicateReceipt,
    Sale(SaleError),
}

impl From<SaleError> for AttemptError {
    fn from(err: SaleError) -> Self {
        AttemptError::Sale(err)
    }
}

impl From<DbError> for AttemptError {
    fn from(err: DbError) -> Self {
        AttemptError::Sale(err.into())
    }
}

// =============================================================================
// Checkout
// =============================================================================

type ReceiptGenerator = Arc<dyn Fn(DateTime<Utc>) -> String + Send + Sync>;

/// `RCP-<unix millis>-<6 hex chars>`, e.g. `RCP-1737368400123-4F0A9C`.
pub fn default_receipt_number(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("RCP-{}-{}", now.timestamp_millis(), suffix[..6].to_uppercase())
}

/// The sale-creation engine.
#[derive(Clone)]
pub struct Checkout {
    pool: SqlitePool,
    config: CheckoutConfig,
    receipts: ReceiptGenerator,
}

impl fmt::Debug for Checkout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checkout")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Checkout {
    pub fn new(pool: SqlitePool, config: CheckoutConfig) -> Self {
        Checkout {
            pool,
            config,
            receipts: Arc::new(default_receipt_number),
        }
    }

    /// Replaces the receipt-number scheme.
    pub fn with_receipt_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn(DateTime<Utc>) -> String + Send + Sync + 'static,
    {
        self.receipts = Arc::new(generator);
        self
    }

    /// Creates a sale atomically.
    ///
    /// ## Returns
    /// * `Ok(SaleReceipt)` - sale, items, stock and daily summary committed
    /// * `Err(SaleError)` - nothing committed
    #[instrument(skip(self, request), fields(cashier_id = %request.cashier_id, lines = request.items.len()))]
    pub async fn create_sale(&self, request: CreateSale) -> Result<SaleReceipt, SaleError> {
        validate_basket(&request.items)?;

        let mut receipt_retries = 0;
        let mut conflict_retries = 0;

        let receipt = loop {
            match self.attempt(&request).await {
                Ok(receipt) => break receipt,

                Err(AttemptError::DuplicateReceipt) => {
                    receipt_retries += 1;
                    if receipt_retries > self.config.max_receipt_retries {
                        warn!(receipt_retries, "Receipt number collisions exhausted retries");
                        return Err(SaleError::Conflict);
                    }
                    debug!(receipt_retries, "Receipt number collision, regenerating");
                }

                Err(AttemptError::Sale(SaleError::Conflict)) => {
                    conflict_retries += 1;
                    if conflict_retries > self.config.max_conflict_retries {
                        warn!(conflict_retries, "Write conflict persisted, giving up");
                        return Err(SaleError::Conflict);
                    }
                    debug!(conflict_retries, "Write conflict, retrying sale");
                    tokio::time::sleep(self.config.retry_backoff * conflict_retries).await;
                }

                Err(AttemptError::Sale(e)) => return Err(e),
            }
        };

        info!(
            sale_id = %receipt.sale_id,
            receipt_number = %receipt.receipt_number,
            total = %receipt.total(),
            "Sale created"
        );

        AuditRepository::new(self.pool.clone())
            .record_best_effort(
                &request.cashier_id,
                AuditAction::CreateSale,
                Some("sales"),
                Some(&receipt.sale_id),
            )
            .await;

        Ok(receipt)
    }

    /// One full read-plan-write cycle.
    async fn attempt(&self, request: &CreateSale) -> Result<SaleReceipt, AttemptError> {
        let plan = self.plan(&request.items).await?;

        let now = Utc::now();
        let sale = Sale {
            id: generate_sale_id(),
            receipt_number: (self.receipts)(now),
            cashier_id: request.cashier_id.clone(),
            cashier_name: None,
            total_cents: plan.total.cents(),
            payment_method: request.payment_method,
            customer_name: non_blank(&request.customer.customer_name),
            customer_phone: non_blank(&request.customer.customer_phone),
            notes: non_blank(&request.customer.notes),
            created_at: now,
        };

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        match SaleRepository::insert(&mut tx, &sale).await {
            Ok(()) => {}
            Err(DbError::UniqueViolation { field, .. }) if field.ends_with("receipt_number") => {
                return Err(AttemptError::DuplicateReceipt);
            }
            Err(DbError::ForeignKeyViolation { .. }) => {
                return Err(SaleError::Validation(ValidationError::InvalidFormat {
                    field: "cashier_id".to_string(),
                    reason: "unknown cashier".to_string(),
                })
                .into());
            }
            Err(e) => return Err(e.into()),
        }

        let demand = plan.demand();
        let mut taken: HashMap<&str, i64> = HashMap::new();

        for line in &plan.lines {
            let id = line.product_id.as_str();
            let already = taken.get(id).copied().unwrap_or(0);

            if !ProductRepository::decrement_stock(&mut tx, id, line.quantity).await? {
                // Stock moved since the snapshot was read.
                return Err(match ProductRepository::stock_level(&mut tx, id).await? {
                    None => SaleError::UnknownProduct(id.to_string()),
                    Some(current) => SaleError::InsufficientStock {
                        product_id: id.to_string(),
                        available: current + already,
                        requested: demand.get(id).copied().unwrap_or(line.quantity),
                    },
                }
                .into());
            }
            taken.insert(id, already + line.quantity);

            let item = SaleItem {
                id: generate_sale_item_id(),
                sale_id: sale.id.clone(),
                product_id: line.product_id.clone(),
                line_number: line.line_number,
                product_name: line.product_name.clone(),
                barcode: line.barcode.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price.cents(),
                total_price_cents: line.line_total.cents(),
            };
            SaleRepository::insert_item(&mut tx, &item).await?;
        }

        DailySummaryRepository::record(
            &mut tx,
            now.date_naive(),
            plan.total,
            request.payment_method,
            now,
        )
        .await?;

        tx.commit().await.map_err(DbError::from)?;

        Ok(SaleReceipt {
            sale_id: sale.id,
            receipt_number: sale.receipt_number,
            total_cents: sale.total_cents,
        })
    }

    /// Reads the products the basket names and prices the basket against them.
    async fn plan(&self, basket: &[BasketLine]) -> Result<SalePlan, SaleError> {
        let mut ids: Vec<&str> = basket.iter().map(|l| l.product_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();

        let catalog = ProductRepository::new(self.pool.clone())
            .get_many(&ids)
            .await?;

        Ok(plan_sale(basket, &catalog)?)
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Unit Tests
// =============================================================================
