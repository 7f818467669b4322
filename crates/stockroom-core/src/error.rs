//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule and lookup failures              │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockroom-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures (wraps CoreError)  │
//! │                                                                         │
//! │  HTTP errors (apps/api)                                                │
//! │  └── ApiError         - Status code + {"error": "..."} body            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, ID, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to exactly one HTTP status

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every business-rule violation is detected synchronously and returned as
/// one of these. Nothing in the core retries.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    ///
    /// ## When This Occurs
    /// - Product ID doesn't exist
    /// - Product exists but belongs to a different store than the request
    #[error("Product {0} not found")]
    ProductNotFound(String),

    /// Transaction cannot be found.
    #[error("Transaction {0} not found")]
    TransactionNotFound(String),

    /// User cannot be found.
    #[error("User {0} not found")]
    UserNotFound(String),

    /// Insufficient stock to complete a sale line.
    ///
    /// ## User Workflow
    /// ```text
    /// POST /transactions (Widget × 5)
    ///      │
    ///      ▼
    /// Check stock: pieces=3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Widget", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// 400 {"error": "Insufficient quantity for product Widget: ..."}
    /// ```
    #[error("Insufficient quantity for product {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// A request argument is missing or malformed in a way that is not a
    /// single-field validation failure (e.g. no report scope at all).
    #[error("{0}")]
    InvalidArgument(String),

    /// The acting user lacks the role required for the operation.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Login failed. Deliberately does not say whether the username exists.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidArgument error.
    pub fn invalid(message: impl Into<String>) -> Self {
        CoreError::InvalidArgument(message.into())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {}", allowed.join(", "))]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate username).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Widget".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient quantity for product Widget: available 3, requested 5"
        );

        let err = CoreError::ProductNotFound("abc".to_string());
        assert_eq!(err.to_string(), "Product abc not found");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "store".to_string(),
        };
        assert_eq!(err.to_string(), "store is required");

        let err = ValidationError::NotAllowed {
            field: "period".to_string(),
            allowed: vec!["daily".to_string(), "weekly".to_string()],
        };
        assert_eq!(err.to_string(), "period must be one of: daily, weekly");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "item".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
