//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! This crate holds the domain model and every calculation of the
//! inventory and sales-tracking service as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │    /api/products  /api/transactions  /api/users  /health       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               stockroom-db (Database Layer)                     │   │
//! │  │    Posting engine execution, ledger queries, repositories      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockroom-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  money  │ │ period  │ │ posting │ │ report  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Transaction, LineItem, User)
//! - [`money`] - Integer money, currencies and tagged currency amounts
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//! - [`period`] - Report window resolution (daily/weekly/monthly/yearly/range)
//! - [`posting`] - Posting plan: request checks and line snapshots
//! - [`report`] - Report folds over fetched transactions
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::money::{Currency, Money};
//!
//! let price = Money::from_cents(1000); // 10.00
//! let total = price.multiply_quantity(3);
//!
//! assert_eq!(total.cents(), 3000);
//! assert_eq!(Currency::Lrd.code(), "LRD");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod period;
pub mod posting;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Currency, CurrencyAmount, DualTotals, Money};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of line items in one posted transaction.
pub const MAX_LINE_ITEMS: usize = 100;

/// Maximum quantity on a single line item.
///
/// Guards against typos like 10000 instead of 100.
pub const MAX_LINE_QUANTITY: i64 = 100_000;

/// Largest accepted unit price, in cents (1 billion major units).
///
/// A full transaction at this price, `MAX_LINE_QUANTITY` and
/// `MAX_LINE_ITEMS` stays far below `i64::MAX`.
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;

/// Largest stock or carton count a product may hold.
pub const MAX_STOCK_COUNT: i64 = 1_000_000_000_000;

/// Number of products returned by the top-products query.
pub const TOP_PRODUCTS_LIMIT: usize = 10;

/// Default page size for product listings.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Upper bound on the requested page size.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Generates a new entity id (UUID v4, hyphenated).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
