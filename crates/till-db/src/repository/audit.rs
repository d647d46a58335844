//! # Audit Repository
//!
//! Append-only log of who did what. Entries are never updated or deleted.

use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::DbResult;
use till_core::{AuditAction, AuditEntry, AuditPage, Pagination};

/// Default page size for [`AuditRepository::list`].
pub const DEFAULT_AUDIT_PAGE_SIZE: i64 = 50;

/// Filters for [`AuditRepository::list`].
#[derive(Debug, Clone)]
pub struct AuditFilter {
    pub limit: i64,
    pub offset: i64,
    pub user_id: Option<String>,
    /// Substring match on the action name, e.g. `"PRODUCT"`.
    pub action: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Default for AuditFilter {
    fn default() -> Self {
        AuditFilter {
            limit: DEFAULT_AUDIT_PAGE_SIZE,
            offset: 0,
            user_id: None,
            action: None,
            start_date: None,
            end_date: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    /// Appends an entry and returns it.
    pub async fn append(
        &self,
        user_id: &str,
        action: AuditAction,
        table_name: Option<&str>,
        record_id: Option<&str>,
    ) -> DbResult<AuditEntry> {
        let entry = AuditEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            user_name: None,
            user_email: None,
            action,
            table_name: table_name.map(str::to_string),
            record_id: record_id.map(str::to_string),
            created_at: Utc::now(),
        };

        debug!(user_id = %user_id, action = %action, "Appending audit entry");

        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, user_id, action, table_name, record_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.user_id)
        .bind(entry.action)
        .bind(&entry.table_name)
        .bind(&entry.record_id)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Appends an entry, logging instead of failing.
    ///
    /// Used after the audited operation has already committed: a lost
    /// audit row must not turn a successful operation into an error.
    pub async fn record_best_effort(
        &self,
        user_id: &str,
        action: AuditAction,
        table_name: Option<&str>,
        record_id: Option<&str>,
    ) {
        if let Err(e) = self.append(user_id, action, table_name, record_id).await {
            warn!(
                error = %e,
                user_id = %user_id,
                action = %action,
                record_id = ?record_id,
                "Failed to write audit entry"
            );
        }
    }

    /// One page of entries, newest first, with the acting user's name and email.
    pub async fn list(&self, filter: &AuditFilter) -> DbResult<AuditPage> {
        let limit = filter.limit.clamp(1, 500);
        let offset = filter.offset.max(0);

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT a.id, a.user_id, u.name AS user_name, u.email AS user_email,
                   a.action, a.table_name, a.record_id, a.created_at
            FROM audit_logs a
            LEFT JOIN users u ON u.id = a.user_id
            WHERE 1=1
            "#,
        );
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY a.created_at DESC, a.rowid DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let logs = qb.build_query_as::<AuditEntry>().fetch_all(&self.pool).await?;

        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM audit_logs a WHERE 1=1");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        Ok(AuditPage {
            logs,
            pagination: Pagination::new(total, limit, offset),
        })
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &AuditFilter) {
    if let Some(user_id) = &filter.user_id {
        qb.push(" AND a.user_id = ").push_bind(user_id.clone());
    }
    if let Some(action) = &filter.action {
        qb.push(" AND a.action LIKE ")
            .push_bind(format!("%{}%", action.trim().to_uppercase()));
    }
    if let Some(start) = filter.start_date {
        qb.push(" AND DATE(a.created_at) >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        qb.push(" AND DATE(a.created_at) <= ").push_bind(end);
    }
}
