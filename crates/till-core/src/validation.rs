//! # Validation Module
//!
//! Input validation for Till.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor (axum Json)                                   │
//! │  └── Shape and type checks (deserialization)                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Business rules: quantities, names, prices, emails                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0)                                                │
//! │  ├── UNIQUE (barcode, email, receipt_number)                           │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::{BasketLine, ProductInput};
use crate::{MAX_BASKET_LINES, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn required_trimmed<'a>(field: &str, value: &'a str, max: usize) -> ValidationResult<&'a str> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value)
}

/// Validates a product name: non-empty, at most 200 characters.
///
/// ```rust
/// use till_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Coca Cola 500ml").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required_trimmed("name", name, 200).map(|_| ())
}

/// Validates a barcode: non-empty, at most 64 characters, no whitespace.
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = required_trimmed("barcode", barcode, 64)?;

    if barcode.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must not contain spaces".to_string(),
        });
    }

    Ok(())
}

/// Validates a product category: non-empty, at most 100 characters.
pub fn validate_category(category: &str) -> ValidationResult<()> {
    required_trimmed("category", category, 100).map(|_| ())
}

/// Validates a person's display name: 2 to 100 characters.
pub fn validate_user_name(name: &str) -> ValidationResult<()> {
    let name = required_trimmed("name", name, 100)?;

    if name.chars().count() < 2 {
        return Err(ValidationError::TooShort {
            field: "name".to_string(),
            min: 2,
        });
    }

    Ok(())
}

/// Minimal structural email check: `local@domain.tld`.
///
/// ```rust
/// use till_core::validation::validate_email;
///
/// assert!(validate_email("admin@supermarket.com").is_ok());
/// assert!(validate_email("admin@localhost").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = required_trimmed("email", email, 254)?;

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must be a valid email address".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || email.chars().any(char::is_whitespace)
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a new password: at least 6 characters.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.chars().count() < 6 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        });
    }

    Ok(())
}

/// Validates a search query. Empty is fine; returns the trimmed query.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Parses a `YYYY-MM-DD` date parameter.
pub fn parse_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "expected YYYY-MM-DD".to_string(),
    })
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a basket line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in minor units. Zero is allowed (free items).
///
/// ```rust
/// use till_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(150).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-1).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock-like counter (`stock`, `min_stock`).
pub fn validate_stock_level(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates every field of a product create/update payload.
pub fn validate_product_input(input: &ProductInput) -> ValidationResult<()> {
    validate_product_name(&input.name)?;
    validate_barcode(&input.barcode)?;
    validate_category(&input.category)?;
    validate_price_cents(input.price_cents)?;
    validate_stock_level("stock", input.stock)?;
    validate_stock_level("min_stock", input.min_stock)?;
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates a basket before any catalog lookup.
///
/// ## Rules
/// - At least one line
/// - At most MAX_BASKET_LINES (100) lines
/// - Every line has a product id and a valid quantity
pub fn validate_basket(basket: &[BasketLine]) -> ValidationResult<()> {
    if basket.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if basket.len() > MAX_BASKET_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_BASKET_LINES as i64,
        });
    }

    for line in basket {
        if line.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "product_id".to_string(),
            });
        }
        validate_quantity(line.quantity)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Milk 1L").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode("1234567890123").is_ok());
        assert!(validate_barcode("").is_err());
        assert!(validate_barcode("123 456").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("cashier@shop.co.ug").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@shop.com").is_err());
        assert!(validate_email("a@b@c.com").is_err());
        assert!(validate_email("a@shop.").is_err());
    }

    #[test]
    fn test_validate_password_and_name() {
        assert!(validate_password("admin123").is_ok());
        assert!(matches!(
            validate_password("12345"),
            Err(ValidationError::TooShort { min: 6, .. })
        ));
        assert!(validate_user_name("Jo").is_ok());
        assert!(validate_user_name("J").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_and_stock() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-100).is_err());
        assert!(validate_stock_level("stock", 0).is_ok());
        assert!(validate_stock_level("min_stock", -1).is_err());
    }

    #[test]
    fn test_validate_product_input() {
        let input = ProductInput {
            name: "Milk 1L".to_string(),
            barcode: "3456789012345".to_string(),
            category: "Dairy".to_string(),
            price_cents: 350,
            stock: 30,
            min_stock: 5,
            expiry_date: None,
            supplier: None,
            description: None,
        };
        assert!(validate_product_input(&input).is_ok());

        let negative = ProductInput {
            min_stock: -1,
            ..input.clone()
        };
        assert!(matches!(
            validate_product_input(&negative),
            Err(ValidationError::MustNotBeNegative { .. })
        ));

        let unnamed = ProductInput {
            category: " ".to_string(),
            ..input
        };
        assert!(validate_product_input(&unnamed).is_err());
    }

    #[test]
    fn test_validate_basket() {
        assert!(validate_basket(&[BasketLine::new("p", 1)]).is_ok());
        assert!(matches!(
            validate_basket(&[]),
            Err(ValidationError::Required { .. })
        ));
        assert!(validate_basket(&[BasketLine::new("", 1)]).is_err());
        assert!(validate_basket(&[BasketLine::new("p", 0)]).is_err());

        let too_many: Vec<_> = (0..=MAX_BASKET_LINES).map(|_| BasketLine::new("p", 1)).collect();
        assert!(validate_basket(&too_many).is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("date", "2025-01-20").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 20).unwrap()
        );
        assert!(parse_date("date", "20/01/2025").is_err());
    }
}
