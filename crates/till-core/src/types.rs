//! # Domain Types
//!
//! Core domain types used throughout Till.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──┼─ (via items) ───┼──►│  product_id     │       │
//! │  │  barcode        │   │  receipt_number │   │  name snapshot  │       │
//! │  │  price_cents    │   │  total_cents    │   │  unit_price     │       │
//! │  │  stock ≥ 0      │   │  payment_method │   │  quantity       │       │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────┘       │
//! │                                 │ on commit                             │
//! │                    ┌────────────┴────────────┐                          │
//! │                    ▼                         ▼                          │
//! │  ┌─────────────────────────┐   ┌─────────────────────────┐             │
//! │  │      DailySummary       │   │       AuditEntry        │             │
//! │  │  date (UTC, unique)     │   │  user_id, action        │             │
//! │  │  total + per-method     │   │  table_name, record_id  │             │
//! │  │  total_transactions     │   │  (append-only)          │             │
//! │  └─────────────────────────┘   └─────────────────────────┘             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Money on records
//! Records store `*_cents: i64` (the database column type) and expose
//! [`Money`] through accessors.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Users
// =============================================================================

/// Role of a till operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Manager,
    Cashier,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::Admin, UserRole::Manager, UserRole::Cashier];

    pub const fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::Cashier => "cashier",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: UserRole::ALL.iter().map(|r| r.as_str().to_string()).collect(),
            })
    }
}

/// A till operator account.
///
/// The password hash never leaves the server: it is skipped on serialization
/// and absent from the generated TypeScript type.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub role: UserRole,
    pub avatar: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product on the shelf.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Barcode (EAN-13 etc.), unique across the catalog.
    pub barcode: String,

    pub category: String,

    /// Price in minor units.
    pub price_cents: i64,

    /// Units on the shelf. Never negative after a committed transaction.
    pub stock: i64,

    /// Reorder threshold: `stock <= min_stock` is "low stock".
    pub min_stock: i64,

    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,

    pub supplier: Option<String>,

    pub description: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }

    /// True when `quantity` units can come off the shelf.
    #[inline]
    pub fn can_fulfil(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

/// Editable product fields, as submitted for create and full update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductInput {
    pub name: String,
    pub barcode: String,
    pub category: String,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub min_stock: i64,
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ProductInput {
    /// Builds a new catalog record with trimmed text fields.
    pub fn into_product(self, id: String, now: DateTime<Utc>) -> Product {
        Product {
            id,
            name: self.name.trim().to_string(),
            barcode: self.barcode.trim().to_string(),
            category: self.category.trim().to_string(),
            price_cents: self.price_cents,
            stock: self.stock,
            min_stock: self.min_stock,
            expiry_date: self.expiry_date,
            supplier: self.supplier,
            description: self.description,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid.
///
/// Each method has its own running subtotal column in the daily summary.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    /// Sold on credit ("put it on my tab").
    Debt,
    /// MTN mobile money.
    Momo,
    AirtelMoney,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Debt,
        PaymentMethod::Momo,
        PaymentMethod::AirtelMoney,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Debt => "debt",
            PaymentMethod::Momo => "momo",
            PaymentMethod::AirtelMoney => "airtel_money",
        }
    }

    /// Name of this method's subtotal column in `daily_sales_summary`.
    ///
    /// Static strings only: the result is spliced into SQL.
    pub const fn summary_column(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash_sales_cents",
            PaymentMethod::Card => "card_sales_cents",
            PaymentMethod::Debt => "debt_sales_cents",
            PaymentMethod::Momo => "momo_sales_cents",
            PaymentMethod::AirtelMoney => "airtel_money_sales_cents",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// Human-facing identifier printed on the receipt (unique).
    pub receipt_number: String,
    pub cashier_id: String,
    /// Joined from `users` on read paths.
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub cashier_name: Option<String>,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line of a sale.
///
/// Snapshot pattern: name, barcode and unit price are frozen at sale time so
/// later catalog edits never rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// 1-based position in the basket.
    pub line_number: i64,
    pub product_name: String,
    pub barcode: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// unit_price × quantity.
    pub total_price_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }
}

/// A sale together with its line items (sale detail view).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// What the checkout hands back to the till after commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleReceipt {
    pub sale_id: String,
    pub receipt_number: String,
    pub total_cents: i64,
}

impl SaleReceipt {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Basket
// =============================================================================

/// One requested line: "this product, this many".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BasketLine {
    pub product_id: String,
    pub quantity: i64,
}

impl BasketLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Optional customer details captured at the till.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInfo {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

// =============================================================================
// Daily Summary
// =============================================================================

/// Running totals for one UTC calendar date.
///
/// ```text
/// ┌──────────────┬──────────────┬─────┬──────┬──────┬──────┬────────┬──────┐
/// │ date         │ total_sales  │cash │ card │ debt │ momo │ airtel │ txns │
/// ├──────────────┼──────────────┼─────┼──────┼──────┼──────┼────────┼──────┤
/// │ 2025-01-20   │ 12.50        │4.50 │ 8.00 │ 0    │ 0    │ 0      │ 2    │
/// └──────────────┴──────────────┴─────┴──────┴──────┴──────┴────────┴──────┘
/// ```
///
/// Invariant: `total_sales == Σ per-method columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DailySummary {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub total_sales_cents: i64,
    pub cash_sales_cents: i64,
    pub card_sales_cents: i64,
    pub debt_sales_cents: i64,
    pub momo_sales_cents: i64,
    pub airtel_money_sales_cents: i64,
    pub total_transactions: i64,
    /// `None` for a date that has no sales yet.
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DailySummary {
    /// Zero-valued summary for a date with no sales.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_sales_cents: 0,
            cash_sales_cents: 0,
            card_sales_cents: 0,
            debt_sales_cents: 0,
            momo_sales_cents: 0,
            airtel_money_sales_cents: 0,
            total_transactions: 0,
            updated_at: None,
        }
    }

    /// Folds one sale into the running totals.
    pub fn record(&mut self, amount: Money, method: PaymentMethod) {
        self.total_sales_cents += amount.cents();
        *self.column_mut(method) += amount.cents();
        self.total_transactions += 1;
    }

    /// Subtotal for one payment method.
    pub fn amount_for(&self, method: PaymentMethod) -> Money {
        let cents = match method {
            PaymentMethod::Cash => self.cash_sales_cents,
            PaymentMethod::Card => self.card_sales_cents,
            PaymentMethod::Debt => self.debt_sales_cents,
            PaymentMethod::Momo => self.momo_sales_cents,
            PaymentMethod::AirtelMoney => self.airtel_money_sales_cents,
        };
        Money::from_cents(cents)
    }

    #[inline]
    pub fn total_sales(&self) -> Money {
        Money::from_cents(self.total_sales_cents)
    }

    fn column_mut(&mut self, method: PaymentMethod) -> &mut i64 {
        match method {
            PaymentMethod::Cash => &mut self.cash_sales_cents,
            PaymentMethod::Card => &mut self.card_sales_cents,
            PaymentMethod::Debt => &mut self.debt_sales_cents,
            PaymentMethod::Momo => &mut self.momo_sales_cents,
            PaymentMethod::AirtelMoney => &mut self.airtel_money_sales_cents,
        }
    }
}

// =============================================================================
// Audit
// =============================================================================

/// Kind of action recorded in the audit log.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Login,
    CreateUser,
    UpdateUserStatus,
    CreateProduct,
    UpdateProduct,
    DeleteProduct,
    CreateSale,
}

impl AuditAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "LOGIN",
            AuditAction::CreateUser => "CREATE_USER",
            AuditAction::UpdateUserStatus => "UPDATE_USER_STATUS",
            AuditAction::CreateProduct => "CREATE_PRODUCT",
            AuditAction::UpdateProduct => "UPDATE_PRODUCT",
            AuditAction::DeleteProduct => "DELETE_PRODUCT",
            AuditAction::CreateSale => "CREATE_SALE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An append-only audit record.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AuditEntry {
    pub id: String,
    pub user_id: String,
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub user_name: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub user_email: Option<String>,
    pub action: AuditAction,
    pub table_name: Option<String>,
    pub record_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Pagination metadata for list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Pagination {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(total: i64, limit: i64, offset: i64) -> Self {
        Self {
            total,
            limit,
            offset,
            has_more: total > offset + limit,
        }
    }
}

/// One page of the audit log.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AuditPage {
    pub logs: Vec<AuditEntry>,
    pub pagination: Pagination,
}

// =============================================================================
// Dashboard
// =============================================================================

/// Headline numbers for the back-office dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    pub total_products: i64,
    pub low_stock_products: i64,
    pub expiring_products: i64,
    pub today_sales_cents: i64,
    pub week_sales_cents: i64,
    pub month_sales_cents: i64,
    pub total_sales_cents: i64,
}

/// Sales grouped by payment method over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PaymentBreakdown {
    pub payment_method: PaymentMethod,
    pub count: i64,
    pub total_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_payment_method_round_trips_through_str() {
        for method in PaymentMethod::ALL {
            assert_eq!(method.as_str().parse::<PaymentMethod>().unwrap(), method);
        }
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_payment_method_wire_format() {
        let json = serde_json::to_string(&PaymentMethod::AirtelMoney).unwrap();
        assert_eq!(json, "\"airtel_money\"");
        let parsed: PaymentMethod = serde_json::from_str("\"momo\"").unwrap();
        assert_eq!(parsed, PaymentMethod::Momo);
    }

    #[test]
    fn test_summary_columns_are_distinct() {
        let mut columns: Vec<_> = PaymentMethod::ALL.iter().map(|m| m.summary_column()).collect();
        columns.sort();
        columns.dedup();
        assert_eq!(columns.len(), PaymentMethod::ALL.len());
    }

    #[test]
    fn test_daily_summary_record() {
        let mut summary = DailySummary::empty(date("2025-01-20"));
        summary.record(Money::from_cents(450), PaymentMethod::Cash);
        summary.record(Money::from_cents(800), PaymentMethod::Card);
        summary.record(Money::from_cents(50), PaymentMethod::Cash);

        assert_eq!(summary.total_sales_cents, 1300);
        assert_eq!(summary.amount_for(PaymentMethod::Cash).cents(), 500);
        assert_eq!(summary.amount_for(PaymentMethod::Card).cents(), 800);
        assert_eq!(summary.amount_for(PaymentMethod::Momo).cents(), 0);
        assert_eq!(summary.total_transactions, 3);

        let per_method: Money = PaymentMethod::ALL.iter().map(|m| summary.amount_for(*m)).sum();
        assert_eq!(per_method, summary.total_sales());
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let summary = DailySummary::empty(date("2025-01-20"));
        assert!(summary.total_sales().is_zero());
        assert_eq!(summary.total_transactions, 0);
        assert!(summary.updated_at.is_none());
    }

    #[test]
    fn test_user_role_parse() {
        assert_eq!("cashier".parse::<UserRole>().unwrap(), UserRole::Cashier);
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_user_password_hash_not_serialized() {
        let now = Utc::now();
        let user = User {
            id: "u-1".to_string(),
            name: "Ama".to_string(),
            email: "ama@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: UserRole::Cashier,
            avatar: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn test_pagination_has_more() {
        assert!(Pagination::new(120, 50, 50).has_more);
        assert!(!Pagination::new(100, 50, 50).has_more);
    }

    #[test]
    fn test_audit_action_wire_format() {
        let json = serde_json::to_string(&AuditAction::CreateSale).unwrap();
        assert_eq!(json, "\"CREATE_SALE\"");
        assert_eq!(AuditAction::UpdateUserStatus.to_string(), "UPDATE_USER_STATUS");
    }
}
