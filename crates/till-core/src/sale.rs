//! # Sale Planning
//!
//! Turns a basket into a priced, stock-checked plan before anything is
//! written. The database layer executes the plan inside one transaction.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  basket: [{P, 1}, {Q, 2}, {P, 4}]        catalog snapshot: {P, Q}       │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  validate_basket  ── empty / qty ≤ 0 / too many lines ──► Validation   │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  for each line, in order:                                               │
//! │     ├── product missing?              ──► UnknownProduct(id)            │
//! │     ├── demand[id] += qty                                               │
//! │     ├── demand[id] > stock?           ──► InsufficientStock(cumulative) │
//! │     └── line_total = price × qty  (exact, minor units)                  │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  SalePlan { lines (basket order, not merged), total = Σ line_total }    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines for the same product are never merged: each keeps its own sale item,
//! but the stock check sees everything earlier lines already claimed.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{BasketLine, Product};
use crate::validation::validate_basket;

/// One priced basket line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    /// 1-based basket position.
    pub line_number: i64,
    pub product_id: String,
    pub product_name: String,
    pub barcode: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

/// A basket that passed every check, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalePlan {
    pub lines: Vec<PlannedLine>,
    pub total: Money,
}

impl SalePlan {
    /// Total units requested per product across all lines.
    pub fn demand(&self) -> HashMap<&str, i64> {
        let mut demand = HashMap::new();
        for line in &self.lines {
            *demand.entry(line.product_id.as_str()).or_insert(0) += line.quantity;
        }
        demand
    }
}

/// Prices a basket against a catalog snapshot and checks cumulative stock.
///
/// `catalog` maps product id to the product as read just before planning.
/// Missing entries mean the product does not exist.
pub fn plan_sale(basket: &[BasketLine], catalog: &HashMap<String, Product>) -> CoreResult<SalePlan> {
    validate_basket(basket)?;

    let mut demand: HashMap<&str, i64> = HashMap::new();
    let mut lines = Vec::with_capacity(basket.len());
    let mut total = Money::zero();

    for (index, line) in basket.iter().enumerate() {
        let product = catalog
            .get(&line.product_id)
            .ok_or_else(|| CoreError::UnknownProduct(line.product_id.clone()))?;

        let requested = demand.entry(product.id.as_str()).or_insert(0);
        *requested += line.quantity;
        if !product.can_fulfil(*requested) {
            return Err(CoreError::InsufficientStock {
                product_id: product.id.clone(),
                available: product.stock,
                requested: *requested,
            });
        }

        let unit_price = product.price();
        let line_total = unit_price
            .checked_multiply_quantity(line.quantity)
            .ok_or_else(|| CoreError::AmountOverflow {
                context: format!("line {}", index + 1),
            })?;
        total = total
            .checked_add(line_total)
            .ok_or_else(|| CoreError::AmountOverflow {
                context: "sale total".to_string(),
            })?;

        lines.push(PlannedLine {
            line_number: index as i64 + 1,
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            barcode: product.barcode.clone(),
            quantity: line.quantity,
            unit_price,
            line_total,
        });
    }

    Ok(SalePlan { lines, total })
}

// =============================================================================
// Unit Tests
// =============================================================================
