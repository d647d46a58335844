//! # Sale Repository
//!
//! Database operations for sales and sale items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  Sales are written exactly once, by the checkout transaction:          │
//! │                                                                         │
//! │     BEGIN                                                              │
//! │     ├── insert(sale)          ← takes the write lock first             │
//! │     ├── insert_item(line 1)                                            │
//! │     ├── insert_item(line 2) …                                          │
//! │     COMMIT                                                             │
//! │                                                                         │
//! │  After that they are read-only: get_by_id, get_items, list, recent.    │
//! │  There is no update or delete.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use till_core::{PaymentMethod, Sale, SaleItem, SaleWithItems};

const SALE_SELECT: &str = r#"
    SELECT s.id, s.receipt_number, s.cashier_id, u.name AS cashier_name,
           s.total_cents, s.payment_method, s.customer_name, s.customer_phone,
           s.notes, s.created_at
    FROM sales s
    LEFT JOIN users u ON u.id = s.cashier_id
"#;

/// Filters for [`SaleRepository::list`]. Dates are inclusive UTC dates.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub cashier_id: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!("{SALE_SELECT} WHERE s.id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets a sale by its receipt number.
    pub async fn get_by_receipt(&self, receipt_number: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!("{SALE_SELECT} WHERE s.receipt_number = ?1"))
            .bind(receipt_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Line items of a sale in basket order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, line_number, product_name, barcode,
                   quantity, unit_price_cents, total_price_cents
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY line_number
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Sale header plus items, `None` when the sale doesn't exist.
    pub async fn get_with_items(&self, id: &str) -> DbResult<Option<SaleWithItems>> {
        let Some(sale) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let items = self.get_items(id).await?;
        Ok(Some(SaleWithItems { sale, items }))
    }

    /// Lists sales matching `filter`, newest first.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        debug!(?filter, "Listing sales");

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SALE_SELECT);
        qb.push(" WHERE 1=1");

        if let Some(start) = filter.start_date {
            qb.push(" AND DATE(s.created_at) >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            qb.push(" AND DATE(s.created_at) <= ").push_bind(end);
        }
        if let Some(cashier_id) = &filter.cashier_id {
            qb.push(" AND s.cashier_id = ").push_bind(cashier_id.clone());
        }
        if let Some(method) = filter.payment_method {
            qb.push(" AND s.payment_method = ").push_bind(method);
        }

        qb.push(" ORDER BY s.created_at DESC, s.rowid DESC");

        let sales = qb.build_query_as::<Sale>().fetch_all(&self.pool).await?;
        Ok(sales)
    }

    /// The latest `limit` sales.
    pub async fn recent(&self, limit: i64) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "{SALE_SELECT} ORDER BY s.created_at DESC, s.rowid DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Transaction-scoped operations
    // =========================================================================

    /// Inserts a sale header on the caller's connection.
    ///
    /// A clashing receipt number surfaces as
    /// `DbError::UniqueViolation { field: "sales.receipt_number", .. }`.
    pub async fn insert(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sales (
                id, receipt_number, cashier_id, total_cents, payment_method,
                customer_name, customer_phone, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.receipt_number)
        .bind(&sale.cashier_id)
        .bind(sale.total_cents)
        .bind(sale.payment_method)
        .bind(&sale.customer_name)
        .bind(&sale.customer_phone)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts one line item on the caller's connection.
    pub async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, product_id, line_number, product_name, barcode,
                quantity, unit_price_cents, total_price_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(item.line_number)
        .bind(&item.product_name)
        .bind(&item.barcode)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.total_price_cents)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

/// Generates a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new sale item ID.
pub fn generate_sale_item_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{insert_cashier, sample_product, test_db};
    use chrono::{Duration, Utc};

    async fn write_sale(
        db: &crate::Database,
        cashier_id: &str,
        product: &till_core::Product,
        receipt: &str,
        method: PaymentMethod,
        created_at: chrono::DateTime<Utc>,
    ) -> Sale {
        let sale = Sale {
            id: generate_sale_id(),
            receipt_number: receipt.to_string(),
            cashier_id: cashier_id.to_string(),
            cashier_name: None,
            total_cents: product.price_cents * 2,
            payment_method: method,
            customer_name: Some("Walk-in".to_string()),
            customer_phone: None,
            notes: None,
            created_at,
        };
        let item = SaleItem {
            id: generate_sale_item_id(),
            sale_id: sale.id.clone(),
            product_id: product.id.clone(),
            line_number: 1,
            product_name: product.name.clone(),
            barcode: product.barcode.clone(),
            quantity: 2,
            unit_price_cents: product.price_cents,
            total_price_cents: product.price_cents * 2,
        };

        let mut tx = db.pool().begin().await.unwrap();
        SaleRepository::insert(&mut tx, &sale).await.unwrap();
        SaleRepository::insert_item(&mut tx, &item).await.unwrap();
        tx.commit().await.unwrap();
        sale
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let db = test_db().await;
        let cashier = insert_cashier(&db).await;
        let product = sample_product("Milk 1L", "345", 350, 30);
        db.products().insert(&product).await.unwrap();

        let sale = write_sale(&db, &cashier.id, &product, "RCP-1", PaymentMethod::Momo, Utc::now()).await;

        let found = db.sales().get_with_items(&sale.id).await.unwrap().unwrap();
        assert_eq!(found.sale.receipt_number, "RCP-1");
        assert_eq!(found.sale.cashier_name.as_deref(), Some("Test User"));
        assert_eq!(found.sale.payment_method, PaymentMethod::Momo);
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].total_price_cents, 700);
        assert_eq!(found.items[0].product_name, "Milk 1L");

        let by_receipt = db.sales().get_by_receipt("RCP-1").await.unwrap().unwrap();
        assert_eq!(by_receipt.id, sale.id);
        assert!(db.sales().get_with_items("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = test_db().await;
        let cashier = insert_cashier(&db).await;
        let other = insert_cashier(&db).await;
        let product = sample_product("Bread", "234", 200, 50);
        db.products().insert(&product).await.unwrap();

        let now = Utc::now();
        let yesterday = now - Duration::days(1);
        write_sale(&db, &cashier.id, &product, "RCP-A", PaymentMethod::Cash, yesterday).await;
        write_sale(&db, &cashier.id, &product, "RCP-B", PaymentMethod::Card, now).await;
        write_sale(&db, &other.id, &product, "RCP-C", PaymentMethod::Cash, now).await;

        let all = db.sales().list(&SaleFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all.last().unwrap().receipt_number, "RCP-A");

        let today_only = db
            .sales()
            .list(&SaleFilter {
                start_date: Some(now.date_naive()),
                end_date: Some(now.date_naive()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(today_only.len(), 2);

        let cash = db
            .sales()
            .list(&SaleFilter {
                payment_method: Some(PaymentMethod::Cash),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(cash.len(), 2);

        let by_cashier = db
            .sales()
            .list(&SaleFilter {
                cashier_id: Some(other.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_cashier.len(), 1);
        assert_eq!(by_cashier[0].receipt_number, "RCP-C");

        let recent = db.sales().recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(db.sales().count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_receipt_number() {
        let db = test_db().await;
        let cashier = insert_cashier(&db).await;
        let product = sample_product("Bread", "234", 200, 50);
        db.products().insert(&product).await.unwrap();
        let first = write_sale(&db, &cashier.id, &product, "RCP-X", PaymentMethod::Cash, Utc::now()).await;

        let clash = Sale {
            id: generate_sale_id(),
            ..first
        };
        let mut tx = db.pool().begin().await.unwrap();
        let err = SaleRepository::insert(&mut tx, &clash).await.unwrap_err();
        match err {
            crate::DbError::UniqueViolation { field, .. } => {
                assert_eq!(field, "sales.receipt_number")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
