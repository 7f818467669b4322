//! # Validation Module
//!
//! Input validation utilities for Stockroom.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractors (axum)                                       │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── Unknown enum values rejected                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE: field rules                                     │
//! │  ├── store / item / username lengths                                   │
//! │  └── quantity, price, stock ranges, calendar dates                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE (store, item), UNIQUE (username)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::validation::{validate_store, validate_quantity};
//!
//! assert_eq!(validate_store("  Main Street ").unwrap(), "Main Street");
//! assert!(validate_quantity(0).is_err());
//! ```

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{NewProduct, ProductPatch};
use crate::{MAX_LINE_ITEMS, MAX_LINE_QUANTITY, MAX_PRICE_CENTS, MAX_STOCK_COUNT};

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

/// Validates a store name and returns it trimmed.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 100 characters
pub fn validate_store(store: &str) -> ValidationResult<String> {
    required_trimmed("store", store, 100).map(str::to_string)
}

/// Validates a product item name and returns it trimmed.
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 200 characters
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_item_name;
///
/// assert!(validate_item_name("Rice 25kg").is_ok());
/// assert!(validate_item_name("").is_err());
/// ```
pub fn validate_item_name(item: &str) -> ValidationResult<String> {
    required_trimmed("item", item, 200).map(str::to_string)
}

/// Validates a username and returns it trimmed.
pub fn validate_username(username: &str) -> ValidationResult<String> {
    let username = required_trimmed("username", username, 50)?;

    if username.chars().count() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }

    Ok(username.to_string())
}

/// Validates a new password. Passwords are not trimmed.
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

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  POST /api/transactions                                                 │
/// │                                                                         │
/// │  productsSold[i].quantity = 5                                          │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → 400 "quantity must be positive"                  │
/// │       │                                                                 │
/// │       ├── qty > MAX? → 400 "quantity must be between ..."              │
/// │       │                                                                 │
/// │       └── OK → stock check + guarded decrement                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
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

/// Validates a price.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (a product may be unpriced in one currency)
/// - At most MAX_PRICE_CENTS
///
/// ## Example
/// ```rust
/// use stockroom_core::money::Money;
/// use stockroom_core::validation::validate_price;
///
/// assert!(validate_price("priceUSD", Money::from_cents(1099)).is_ok());
/// assert!(validate_price("priceUSD", Money::zero()).is_ok());
/// assert!(validate_price("priceUSD", Money::from_cents(-100)).is_err());
/// assert!(validate_price("priceUSD", Money::from_cents(i64::MAX / 2)).is_err());
/// ```
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() || price.cents() > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a stock or carton count (0..=MAX_STOCK_COUNT).
pub fn validate_count(field: &str, count: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK_COUNT).contains(&count) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_STOCK_COUNT,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of line items of a posting request.
///
/// ## Rules
/// - At least one line
/// - At most MAX_LINE_ITEMS lines
pub fn validate_line_count(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::Required {
            field: "productsSold".to_string(),
        });
    }

    if lines > MAX_LINE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "productsSold".to_string(),
            min: 1,
            max: MAX_LINE_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Product Validators
// =============================================================================

/// Validates and normalizes a new product in place.
pub fn validate_new_product(product: &mut NewProduct) -> ValidationResult<()> {
    product.store = validate_store(&product.store)?;
    product.item = validate_item_name(&product.item)?;
    validate_price("priceLRD", product.price_lrd)?;
    validate_price("priceUSD", product.price_usd)?;
    validate_count("pieces", product.pieces)?;
    if let Some(cts) = product.cts {
        validate_count("cts", cts)?;
    }
    Ok(())
}

/// Validates the fields present in a product patch.
pub fn validate_product_patch(patch: &ProductPatch) -> ValidationResult<()> {
    if let Some(store) = &patch.store {
        validate_store(store)?;
    }
    if let Some(item) = &patch.item {
        validate_item_name(item)?;
    }
    if let Some(price) = patch.price_lrd {
        validate_price("priceLRD", price)?;
    }
    if let Some(price) = patch.price_usd {
        validate_price("priceUSD", price)?;
    }
    if let Some(pieces) = patch.pieces {
        validate_count("pieces", pieces)?;
    }
    if let Some(cts) = patch.cts {
        validate_count("cts", cts)?;
    }
    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Parses a wire date: either a calendar day `YYYY-MM-DD` or an RFC 3339
/// timestamp. Only the UTC calendar day is kept.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use stockroom_core::validation::parse_day;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
/// assert_eq!(parse_day("startDate", "2024-03-06").unwrap(), day);
/// assert_eq!(parse_day("startDate", "2024-03-06T23:10:00Z").unwrap(), day);
/// assert!(parse_day("startDate", "06/03/2024").is_err());
/// ```
pub fn parse_day(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(day);
    }

    parse_timestamp(field, value).map(|at| at.date_naive())
}

/// Parses an RFC 3339 timestamp, or a bare calendar day meaning its UTC
/// midnight.
pub fn parse_timestamp(field: &str, value: &str) -> ValidationResult<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD or an RFC 3339 timestamp".to_string(),
        })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_validate_store() {
        assert_eq!(validate_store(" A ").unwrap(), "A");
        assert!(validate_store("").is_err());
        assert!(validate_store("   ").is_err());
        assert!(validate_store(&"s".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_item_name() {
        assert!(validate_item_name("Coca-Cola 330ml").is_ok());
        assert!(validate_item_name("").is_err());
        assert!(validate_item_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_username_and_password() {
        assert_eq!(validate_username("  ama ").unwrap(), "ama");
        assert!(matches!(
            validate_username("ab"),
            Err(ValidationError::TooShort { min: 3, .. })
        ));
        assert!(validate_username(&"u".repeat(51)).is_err());

        assert!(validate_password("secret").is_ok());
        assert!(validate_password("12345").is_err());
        assert!(validate_password("").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_price_and_count() {
        assert!(validate_price("priceLRD", Money::zero()).is_ok());
        assert!(validate_price("priceLRD", Money::from_cents(-1)).is_err());
        assert!(validate_price("priceLRD", Money::from_cents(MAX_PRICE_CENTS)).is_ok());
        assert!(validate_price("priceLRD", Money::from_cents(MAX_PRICE_CENTS + 1)).is_err());
        assert!(validate_count("pieces", 0).is_ok());
        assert!(validate_count("pieces", -3).is_err());
        assert!(validate_count("pieces", MAX_STOCK_COUNT + 1).is_err());
    }

    #[test]
    fn test_validate_line_count() {
        assert!(validate_line_count(1).is_ok());
        assert!(validate_line_count(0).is_err());
        assert!(validate_line_count(MAX_LINE_ITEMS + 1).is_err());
    }

    #[test]
    fn test_validate_new_product_trims() {
        let mut product = NewProduct {
            store: " A ".to_string(),
            item: " Widget ".to_string(),
            measurement: None,
            product_type: None,
            category: None,
            price_lrd: Money::from_cents(100),
            price_usd: Money::from_cents(1),
            pieces: 10,
            cts: None,
            image: None,
        };
        validate_new_product(&mut product).unwrap();
        assert_eq!(product.store, "A");
        assert_eq!(product.item, "Widget");

        product.pieces = -1;
        assert!(validate_new_product(&mut product).is_err());
    }

    #[test]
    fn test_validate_patch_checks_present_fields_only() {
        assert!(validate_product_patch(&ProductPatch::default()).is_ok());
        let patch = ProductPatch {
            price_usd: Some(Money::from_cents(-5)),
            ..Default::default()
        };
        assert!(validate_product_patch(&patch).is_err());
    }

    #[test]
    fn test_parse_timestamp() {
        let at = parse_timestamp("date", "2024-03-06T10:30:00+02:00").unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2024, 3, 6, 8, 30, 0).unwrap());

        let midnight = parse_timestamp("date", "2024-03-06").unwrap();
        assert_eq!(midnight, Utc.with_ymd_and_hms(2024, 3, 6, 0, 0, 0).unwrap());

        assert!(parse_timestamp("date", "yesterday").is_err());
    }

    #[test]
    fn test_parse_day_rejects_impossible_dates() {
        assert!(parse_day("date", "2024-02-30").is_err());
        assert!(parse_day("date", "").is_err());
    }
}
