//! # Seed Data Generator
//!
//! Populates a Till database with a starter catalog for development.
//!
//! ## Usage
//! ```bash
//! # The five starter products
//! cargo run -p till-db --bin seed
//!
//! # Starter products plus 200 generated ones
//! cargo run -p till-db --bin seed -- --extra 200
//!
//! # Specify database path
//! cargo run -p till-db --bin seed -- --db ./data/till.db
//! ```
//!
//! The admin account is not created here: the API server creates it on
//! first start because only it knows how to hash passwords.

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use std::env;
use till_core::Product;
use till_db::{Database, DbConfig};
use tracing::{info, warn};
use uuid::Uuid;

/// name, barcode, category, price (cents), stock, min stock, expiry, supplier, description
type StarterProduct = (
    &'static str,
    &'static str,
    &'static str,
    i64,
    i64,
    i64,
    &'static str,
    &'static str,
    &'static str,
);

const STARTER_PRODUCTS: &[StarterProduct] = &[
    ("Coca Cola 500ml", "1234567890123", "Beverages", 150, 100, 20, "2025-12-31", "Coca Cola Company", "Refreshing soft drink"),
    ("White Bread", "2345678901234", "Bakery", 200, 50, 10, "2025-02-15", "Local Bakery", "Fresh white bread loaf"),
    ("Milk 1L", "3456789012345", "Dairy", 350, 30, 5, "2025-02-10", "Dairy Farm", "Fresh whole milk"),
    ("Rice 5kg", "4567890123456", "Pantry", 1500, 25, 5, "2026-01-01", "Rice Mills", "Premium long grain rice"),
    ("Chicken Breast 1kg", "5678901234567", "Meat", 1200, 20, 3, "2025-01-25", "Poultry Farm", "Fresh chicken breast"),
];

/// Categories and item names for generated products.
const CATEGORIES: &[(&str, &[&str])] = &[
    ("Beverages", &["Pepsi 500ml", "Fanta Orange", "Mineral Water 1.5L", "Mango Juice", "Tea Bags 50s"]),
    ("Bakery", &["Brown Bread", "Croissant", "Chapati Pack", "Muffins 4s", "Doughnuts 6s"]),
    ("Dairy", &["Yoghurt 500ml", "Butter 250g", "Cheddar 200g", "Fresh Cream", "Ghee 500g"]),
    ("Pantry", &["Sugar 2kg", "Maize Flour 2kg", "Cooking Oil 1L", "Salt 1kg", "Beans 1kg"]),
    ("Household", &["Bar Soap", "Washing Powder 1kg", "Toilet Paper 4s", "Matches 10s", "Candles 6s"]),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut extra: usize = 0;
    let mut db_path = String::from("./till.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--extra" | "-e" => {
                if i + 1 < args.len() {
                    extra = args[i + 1]
                        .parse()
                        .with_context(|| format!("invalid --extra value: {}", args[i + 1]))?;
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Till Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -e, --extra <N>    Generated products on top of the starter set (default: 0)");
                println!("  -d, --db <PATH>    Database file path (default: ./till.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(database = %db_path, extra, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .context("failed to open database")?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        return Ok(());
    }

    let mut inserted = 0;
    for starter in STARTER_PRODUCTS {
        let product = starter_product(starter)?;
        db.products()
            .insert(&product)
            .await
            .with_context(|| format!("failed to insert {}", product.name))?;
        inserted += 1;
    }

    let start = std::time::Instant::now();
    for n in 0..extra {
        let product = generated_product(n);
        if let Err(e) = db.products().insert(&product).await {
            warn!(name = %product.name, error = %e, "Failed to insert generated product");
            continue;
        }
        inserted += 1;
    }

    info!(inserted, elapsed = ?start.elapsed(), "Seed complete");
    db.close().await;

    Ok(())
}

fn starter_product(
    &(name, barcode, category, price_cents, stock, min_stock, expiry, supplier, description): &StarterProduct,
) -> anyhow::Result<Product> {
    let now = Utc::now();
    let expiry_date = NaiveDate::parse_from_str(expiry, "%Y-%m-%d")
        .with_context(|| format!("bad expiry date for {name}"))?;

    Ok(Product {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        barcode: barcode.to_string(),
        category: category.to_string(),
        price_cents,
        stock,
        min_stock,
        expiry_date: Some(expiry_date),
        supplier: Some(supplier.to_string()),
        description: Some(description.to_string()),
        created_at: now,
        updated_at: now,
    })
}

/// Deterministic filler product number `n`.
fn generated_product(n: usize) -> Product {
    let now = Utc::now();
    let (category, names) = CATEGORIES[n % CATEGORIES.len()];
    let base = names[(n / CATEGORIES.len()) % names.len()];
    let batch = n / (CATEGORIES.len() * 5);

    Product {
        id: Uuid::new_v4().to_string(),
        name: if batch == 0 {
            base.to_string()
        } else {
            format!("{base} #{batch}")
        },
        // EAN-13 shaped, checksum not valid
        barcode: format!("600{:010}", n),
        category: category.to_string(),
        price_cents: 99 + ((n * 37) % 2000) as i64,
        stock: (n % 120) as i64,
        min_stock: 5,
        expiry_date: None,
        supplier: None,
        description: None,
        created_at: now,
        updated_at: now,
    }
}
