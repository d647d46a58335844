//! # Daily Summary Repository
//!
//! One row per UTC date, updated additively inside the checkout
//! transaction.
//!
//! ```text
//!   INSERT INTO daily_sales_summary (date, total, <method column>, txns)
//!   VALUES (?, amount, amount, 1)
//!   ON CONFLICT(date) DO UPDATE SET
//!       total        = total + excluded.total,
//!       <method col> = <method col> + excluded.<method col>,
//!       txns         = txns + 1
//! ```
//!
//! The upsert is a single statement, so two sales landing on the same
//! date can never lose an increment, and because it runs on the sale's
//! connection it commits or rolls back with the sale.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use till_core::{DailySummary, Money, PaymentMethod};

#[derive(Debug, Clone)]
pub struct DailySummaryRepository {
    pool: SqlitePool,
}

impl DailySummaryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DailySummaryRepository { pool }
    }

    /// Summary for `date`. A date with no sales reads as all zeros.
    pub async fn get_for_date(&self, date: NaiveDate) -> DbResult<DailySummary> {
        let summary = sqlx::query_as::<_, DailySummary>(
            r#"
            SELECT date, total_sales_cents, cash_sales_cents, card_sales_cents,
                   debt_sales_cents, momo_sales_cents, airtel_money_sales_cents,
                   total_transactions, updated_at
            FROM daily_sales_summary
            WHERE date = ?1
            "#,
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(summary.unwrap_or_else(|| DailySummary::empty(date)))
    }

    /// Adds one sale to the totals for `date`, on the caller's connection.
    pub async fn record(
        conn: &mut SqliteConnection,
        date: NaiveDate,
        amount: Money,
        method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(%date, amount = %amount, method = %method, "Recording sale in daily summary");

        // The column name comes from a closed enum, never from input.
        let column = method.summary_column();
        let sql = format!(
            r#"
            INSERT INTO daily_sales_summary (
                date, total_sales_cents, {column}, total_transactions, created_at, updated_at
            ) VALUES (?1, ?2, ?2, 1, ?3, ?3)
            ON CONFLICT(date) DO UPDATE SET
                total_sales_cents  = total_sales_cents + excluded.total_sales_cents,
                {column}           = {column} + excluded.{column},
                total_transactions = total_transactions + 1,
                updated_at         = excluded.updated_at
            "#
        );

        sqlx::query(&sql)
            .bind(date)
            .bind(amount.cents())
            .bind(now)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_db;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_missing_date_reads_as_zero() {
        let db = test_db().await;
        let summary = db.summaries().get_for_date(date("2025-01-20")).await.unwrap();
        assert_eq!(summary, DailySummary::empty(date("2025-01-20")));
    }

    #[tokio::test]
    async fn test_record_accumulates_per_method() {
        let db = test_db().await;
        let day = date("2025-01-20");
        let now = Utc::now();

        let mut conn = db.pool().acquire().await.unwrap();
        DailySummaryRepository::record(&mut conn, day, Money::from_cents(450), PaymentMethod::Cash, now)
            .await
            .unwrap();
        DailySummaryRepository::record(&mut conn, day, Money::from_cents(800), PaymentMethod::Card, now)
            .await
            .unwrap();
        DailySummaryRepository::record(&mut conn, day, Money::from_cents(50), PaymentMethod::Cash, now)
            .await
            .unwrap();
        drop(conn);

        let summary = db.summaries().get_for_date(day).await.unwrap();
        assert_eq!(summary.total_sales_cents, 1300);
        assert_eq!(summary.cash_sales_cents, 500);
        assert_eq!(summary.card_sales_cents, 800);
        assert_eq!(summary.momo_sales_cents, 0);
        assert_eq!(summary.total_transactions, 3);
        assert!(summary.updated_at.is_some());

        let other_day = db.summaries().get_for_date(date("2025-01-21")).await.unwrap();
        assert_eq!(other_day.total_transactions, 0);
    }

    #[tokio::test]
    async fn test_record_rolls_back_with_transaction() {
        let db = test_db().await;
        let day = date("2025-02-01");

        let mut tx = db.pool().begin().await.unwrap();
        DailySummaryRepository::record(&mut tx, day, Money::from_cents(999), PaymentMethod::Debt, Utc::now())
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        let summary = db.summaries().get_for_date(day).await.unwrap();
        assert_eq!(summary.total_transactions, 0);
        assert_eq!(summary.debt_sales_cents, 0);
    }
}
