//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - Filtered listing (search, category, low stock)
//! - CRUD
//! - Conditional stock decrement used inside the checkout transaction
//!
//! ## Stock Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: read-then-write                                             │
//! │     SELECT stock …            → 1                                      │
//! │     UPDATE products SET stock = 0                                      │
//! │     (two tills both read 1, both "sell" the last unit)                 │
//! │                                                                         │
//! │  ✅ CORRECT: conditional delta, re-validated under the write lock      │
//! │     UPDATE products SET stock = stock - ?q                             │
//! │      WHERE id = ?id AND stock >= ?q                                    │
//! │     rows_affected == 0  →  not enough stock *right now*                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use till_core::Product;

pub(crate) const PRODUCT_COLUMNS: &str = "id, name, barcode, category, price_cents, stock, min_stock, \
     expiry_date, supplier, description, created_at, updated_at";

/// Filters for [`ProductRepository::list`]. All optional, combined with AND.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Substring match on name or barcode.
    pub search: Option<String>,
    /// Exact category.
    pub category: Option<String>,
    /// Only products at or below their reorder threshold.
    pub low_stock: bool,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products matching `filter`, ordered by name.
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        debug!(?filter, "Listing products");

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE 1=1"));

        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{search}%");
            qb.push(" AND (name LIKE ")
                .push_bind(pattern.clone())
                .push(" OR barcode LIKE ")
                .push_bind(pattern)
                .push(")");
        }

        if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
            qb.push(" AND category = ").push_bind(category.to_string());
        }

        if filter.low_stock {
            qb.push(" AND stock <= min_stock");
        }

        qb.push(" ORDER BY name");

        let products = qb.build_query_as::<Product>().fetch_all(&self.pool).await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its barcode (scanner lookup).
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1"
        ))
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Fetches several products at once, keyed by id. Unknown ids are simply
    /// absent from the map.
    pub async fn get_many(&self, ids: &[&str]) -> DbResult<HashMap<String, Product>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ("));
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.to_string());
        }
        separated.push_unseparated(")");

        let products = qb.build_query_as::<Product>().fetch_all(&self.pool).await?;

        Ok(products.into_iter().map(|p| (p.id.clone(), p)).collect())
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - barcode already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(barcode = %product.barcode, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, barcode, category, price_cents, stock, min_stock,
                expiry_date, supplier, description, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.barcode)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(product.expiry_date)
        .bind(&product.supplier)
        .bind(&product.description)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&product.barcode))?;

        Ok(product.clone())
    }

    /// Replaces the editable fields of an existing product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - the row as stored after the update
    /// * `Err(DbError::NotFound)` - product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                barcode = ?3,
                category = ?4,
                price_cents = ?5,
                stock = ?6,
                min_stock = ?7,
                expiry_date = ?8,
                supplier = ?9,
                description = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.barcode)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(product.expiry_date)
        .bind(&product.supplier)
        .bind(&product.description)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&product.barcode))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        self.get_by_id(&product.id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", &product.id))
    }

    /// Deletes a product.
    ///
    /// Products that appear on past sales are protected by the
    /// `sale_items.product_id` foreign key and yield
    /// `DbError::ForeignKeyViolation`.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Transaction-scoped operations
    // =========================================================================

    /// Takes `quantity` units off the shelf if, and only if, enough remain.
    ///
    /// Runs on the caller's connection so it joins the caller's transaction.
    /// Returns `false` (and changes nothing) when stock is short or the
    /// product has vanished.
    pub async fn decrement_stock(
        conn: &mut SqliteConnection,
        id: &str,
        quantity: i64,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?2,
                updated_at = ?3
            WHERE id = ?1 AND stock >= ?2
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Current stock as seen by the caller's connection/transaction.
    pub async fn stock_level(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<i64>> {
        let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(stock)
    }
}

/// Generates a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_product, test_db};

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let product = sample_product("Coca Cola 500ml", "1234567890123", 150, 100);
        db.products().insert(&product).await.unwrap();

        let found = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Coca Cola 500ml");
        assert_eq!(found.price_cents, 150);
        assert_eq!(found.stock, 100);

        let by_barcode = db
            .products()
            .get_by_barcode("1234567890123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_barcode.id, product.id);
    }

    #[tokio::test]
    async fn test_duplicate_barcode() {
        let db = test_db().await;
        db.products()
            .insert(&sample_product("A", "111", 100, 1))
            .await
            .unwrap();

        let err = db
            .products()
            .insert(&sample_product("B", "111", 100, 1))
            .await
            .unwrap_err();
        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "products.barcode");
                assert_eq!(value, "111");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = test_db().await;
        let repo = db.products();

        let mut milk = sample_product("Milk 1L", "345", 350, 3);
        milk.category = "Dairy".to_string();
        milk.min_stock = 5;
        let mut bread = sample_product("White Bread", "234", 200, 50);
        bread.category = "Bakery".to_string();
        bread.min_stock = 10;
        repo.insert(&milk).await.unwrap();
        repo.insert(&bread).await.unwrap();

        let all = repo.list(&ProductFilter::default()).await.unwrap();
        assert_eq!(
            all.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            vec!["Milk 1L", "White Bread"]
        );

        let search = repo
            .list(&ProductFilter {
                search: Some("brea".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(search.len(), 1);
        assert_eq!(search[0].id, bread.id);

        let by_barcode = repo
            .list(&ProductFilter {
                search: Some("34".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_barcode.len(), 2);

        let dairy = repo
            .list(&ProductFilter {
                category: Some("Dairy".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(dairy.len(), 1);

        let low = repo
            .list(&ProductFilter {
                low_stock: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, milk.id);
    }

    #[tokio::test]
    async fn test_get_many() {
        let db = test_db().await;
        let a = sample_product("A", "1", 100, 1);
        let b = sample_product("B", "2", 100, 1);
        db.products().insert(&a).await.unwrap();
        db.products().insert(&b).await.unwrap();

        let found = db
            .products()
            .get_many(&[a.id.as_str(), b.id.as_str(), "missing"])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.contains_key(&a.id));
        assert!(!found.contains_key("missing"));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = test_db().await;
        let mut product = sample_product("Rice 5kg", "456", 1500, 25);
        db.products().insert(&product).await.unwrap();

        product.price_cents = 1450;
        product.stock = 30;
        let updated = db.products().update(&product).await.unwrap();
        assert_eq!(updated.price_cents, 1450);
        assert_eq!(updated.stock, 30);

        db.products().delete(&product.id).await.unwrap();
        assert!(db.products().get_by_id(&product.id).await.unwrap().is_none());
        assert!(matches!(
            db.products().delete(&product.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_conditional_decrement() {
        let db = test_db().await;
        let product = sample_product("Milk", "345", 350, 2);
        db.products().insert(&product).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(ProductRepository::decrement_stock(&mut conn, &product.id, 2)
            .await
            .unwrap());
        assert!(!ProductRepository::decrement_stock(&mut conn, &product.id, 1)
            .await
            .unwrap());
        assert_eq!(
            ProductRepository::stock_level(&mut conn, &product.id)
                .await
                .unwrap(),
            Some(0)
        );
        assert!(!ProductRepository::decrement_stock(&mut conn, "missing", 1)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_negative_stock_rejected_by_schema() {
        let db = test_db().await;
        let mut product = sample_product("Milk", "345", 350, 2);
        db.products().insert(&product).await.unwrap();

        product.stock = -1;
        let err = db.products().update(&product).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }
}
