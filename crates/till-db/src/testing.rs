//! Shared fixtures for the crate's unit tests.

use chrono::Utc;
use uuid::Uuid;

use crate::{Database, DbConfig};
use till_core::{Product, User, UserRole};

/// Fresh migrated in-memory database.
pub async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

pub fn sample_product(name: &str, barcode: &str, price_cents: i64, stock: i64) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        barcode: barcode.to_string(),
        category: "Groceries".to_string(),
        price_cents,
        stock,
        min_stock: 0,
        expiry_date: None,
        supplier: None,
        description: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_user(email: &str, role: UserRole) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4().to_string(),
        name: "Test User".to_string(),
        email: email.to_string(),
        password_hash: "not-a-real-hash".to_string(),
        role,
        avatar: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Inserts a cashier and returns it.
pub async fn insert_cashier(db: &Database) -> User {
    let user = sample_user(&format!("{}@till.test", Uuid::new_v4().simple()), UserRole::Cashier);
    db.users().insert(&user).await.expect("insert cashier");
    user
}
