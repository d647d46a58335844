//! # Dashboard Repository
//!
//! Read-only aggregates for the back-office dashboard. Every query takes
//! "today" from the caller so results are deterministic under test.
//!
//! ```text
//!   stats(today)
//!   ├── total_products        COUNT(products)
//!   ├── low_stock_products    stock <= min_stock
//!   ├── expiring_products     expiry_date <= today + 7   (already expired included)
//!   ├── today_sales           DATE(created_at) =  today
//!   ├── week_sales            DATE(created_at) >= today - 7
//!   ├── month_sales           DATE(created_at) >= today - 30
//!   └── total_sales           all time
//! ```

use chrono::{Duration, NaiveDate};
use sqlx::SqlitePool;

use super::product::PRODUCT_COLUMNS;
use crate::error::DbResult;
use till_core::{DashboardStats, PaymentBreakdown, Product};

/// Window used for "expiring soon".
pub const EXPIRY_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone)]
pub struct DashboardRepository {
    pool: SqlitePool,
}

impl DashboardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DashboardRepository { pool }
    }

    pub async fn stats(&self, today: NaiveDate) -> DbResult<DashboardStats> {
        let expiry_horizon = today + Duration::days(EXPIRY_WINDOW_DAYS);

        let (total_products, low_stock_products, expiring_products): (i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(CASE WHEN stock <= min_stock THEN 1 ELSE 0 END), 0),
                       COALESCE(SUM(CASE WHEN expiry_date IS NOT NULL
                                          AND DATE(expiry_date) <= ?1 THEN 1 ELSE 0 END), 0)
                FROM products
                "#,
            )
            .bind(expiry_horizon)
            .fetch_one(&self.pool)
            .await?;

        let (today_sales_cents, week_sales_cents, month_sales_cents, total_sales_cents): (
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(CASE WHEN DATE(created_at) = ?1 THEN total_cents END), 0),
                   COALESCE(SUM(CASE WHEN DATE(created_at) >= ?2 THEN total_cents END), 0),
                   COALESCE(SUM(CASE WHEN DATE(created_at) >= ?3 THEN total_cents END), 0),
                   COALESCE(SUM(total_cents), 0)
            FROM sales
            "#,
        )
        .bind(today)
        .bind(today - Duration::days(7))
        .bind(today - Duration::days(30))
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardStats {
            total_products,
            low_stock_products,
            expiring_products,
            today_sales_cents,
            week_sales_cents,
            month_sales_cents,
            total_sales_cents,
        })
    }

    /// Products at or below their reorder level, emptiest first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE stock <= min_stock ORDER BY stock ASC, name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Products expiring between `today` and `today + days`, soonest first.
    pub async fn expiring(&self, today: NaiveDate, days: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE expiry_date IS NOT NULL
              AND DATE(expiry_date) >= ?1
              AND DATE(expiry_date) <= ?2
            ORDER BY expiry_date ASC
            "#
        ))
        .bind(today)
        .bind(today + Duration::days(days))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Count and total per payment method for sales on or after `since`.
    pub async fn sales_by_payment(&self, since: NaiveDate) -> DbResult<Vec<PaymentBreakdown>> {
        let rows = sqlx::query_as::<_, PaymentBreakdown>(
            r#"
            SELECT payment_method, COUNT(*) AS count, COALESCE(SUM(total_cents), 0) AS total_cents
            FROM sales
            WHERE DATE(created_at) >= ?1
            GROUP BY payment_method
            ORDER BY total_cents DESC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_product, test_db};
    use chrono::Utc;

    #[tokio::test]
    async fn test_empty_database() {
        let db = test_db().await;
        let stats = db.dashboard().stats(Utc::now().date_naive()).await.unwrap();
        assert_eq!(stats, DashboardStats::default());
        assert!(db.dashboard().low_stock().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_product_counters() {
        let db = test_db().await;
        let today = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();

        let mut soon = sample_product("Yoghurt", "111", 250, 40);
        soon.expiry_date = Some(today + Duration::days(3));
        let mut expired = sample_product("Old Milk", "222", 300, 5);
        expired.expiry_date = Some(today - Duration::days(1));
        expired.min_stock = 10;
        let mut later = sample_product("Rice 5kg", "333", 1200, 2);
        later.expiry_date = Some(today + Duration::days(90));
        later.min_stock = 2;

        for p in [&soon, &expired, &later] {
            db.products().insert(p).await.unwrap();
        }

        let stats = db.dashboard().stats(today).await.unwrap();
        assert_eq!(stats.total_products, 3);
        assert_eq!(stats.low_stock_products, 2);
        assert_eq!(stats.expiring_products, 2);

        let low = db.dashboard().low_stock().await.unwrap();
        assert_eq!(low[0].name, "Rice 5kg");
        assert_eq!(low[1].name, "Old Milk");

        let expiring = db.dashboard().expiring(today, EXPIRY_WINDOW_DAYS).await.unwrap();
        assert_eq!(expiring.len(), 1);
        assert_eq!(expiring[0].name, "Yoghurt");
    }
}
