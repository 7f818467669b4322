//! # Posting Plan
//!
//! The pure half of transaction posting. The database layer runs the steps
//! below inside one SQLite transaction; everything that does not need the
//! database lives here.
//!
//! ## Posting Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PostRequest { store, type, currency, date?, productsSold[] }          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PostRequest::validate()                 ← this module                 │
//! │       │                                                                 │
//! │       ▼  for each line, in order (database transaction open)           │
//! │  ┌─────────────────────────────────────────────────────────────┐      │
//! │  │ 1. load product by (id, store)        → ProductNotFound     │      │
//! │  │ 2. plan_line(product, line, type)     → InsufficientStock,  │      │
//! │  │                                         InvalidArgument     │      │
//! │  │ 3. apply StockChange (guarded UPDATE) → InsufficientStock   │      │
//! │  │ 4. collect LineItem snapshot                                │      │
//! │  └─────────────────────────────────────────────────────────────┘      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  build_transaction(...) → insert rows → COMMIT                         │
//! │  (any error → ROLLBACK, no stock effects survive)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Currency, CurrencyAmount, Money};
use crate::types::{LineItem, Product, Transaction, TransactionType};
use crate::validation::{validate_line_count, validate_quantity, validate_store};
use crate::MAX_STOCK_COUNT;

// =============================================================================
// Request
// =============================================================================

/// One requested line: a product id and a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// A validated-on-demand posting request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRequest {
    pub store: String,
    pub kind: TransactionType,
    pub currency: Currency,
    /// Business date; `None` means "now".
    pub date: Option<DateTime<Utc>>,
    pub lines: Vec<LineRequest>,
}

impl PostRequest {
    /// Checks request-level rules and normalizes the store name.
    ///
    /// Does not touch stock; per-line stock checks happen in [`plan_line`].
    pub fn validate(mut self) -> CoreResult<Self> {
        self.store = validate_store(&self.store)?;
        validate_line_count(self.lines.len())?;

        for line in &mut self.lines {
            line.product_id = line.product_id.trim().to_string();
            if line.product_id.is_empty() {
                return Err(ValidationError::Required {
                    field: "product".to_string(),
                }
                .into());
            }
            validate_quantity(line.quantity)?;
        }

        Ok(self)
    }
}

// =============================================================================
// Per-Line Planning
// =============================================================================

/// The stock effect of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockChange {
    /// `pieces = pieces - n`, only where `pieces >= n`.
    Decrement(i64),
    /// `pieces = pieces + n`.
    Increment(i64),
}

impl StockChange {
    pub fn for_line(kind: TransactionType, quantity: i64) -> Self {
        match kind {
            TransactionType::Sale => StockChange::Decrement(quantity),
            TransactionType::Restock => StockChange::Increment(quantity),
        }
    }

    /// Signed delta applied to `pieces`.
    pub fn delta(&self) -> i64 {
        match *self {
            StockChange::Decrement(n) => -n,
            StockChange::Increment(n) => n,
        }
    }
}

/// A line that passed its checks: the snapshot to record and the stock
/// change to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub item: LineItem,
    pub change: StockChange,
}

/// Checks one line against the product as loaded inside the database
/// transaction and freezes its snapshot.
///
/// Sales need `pieces >= quantity`. Restocks are refused only when the new
/// count would pass `MAX_STOCK_COUNT`.
pub fn plan_line(product: &Product, line: &LineRequest, kind: TransactionType) -> CoreResult<PlannedLine> {
    match kind {
        TransactionType::Sale if !product.can_sell(line.quantity) => {
            return Err(insufficient_stock(product, line.quantity));
        }
        TransactionType::Restock => {
            let restocked = product.pieces.checked_add(line.quantity);
            if restocked.map_or(true, |pieces| pieces > MAX_STOCK_COUNT) {
                return Err(CoreError::invalid(format!(
                    "Restocking {} would exceed the maximum stock of {MAX_STOCK_COUNT}",
                    product.item
                )));
            }
        }
        TransactionType::Sale => {}
    }

    Ok(PlannedLine {
        item: LineItem {
            product: product.id.clone(),
            product_name: product.item.clone(),
            quantity: line.quantity,
            price_at_sale: product.price_snapshot(),
        },
        change: StockChange::for_line(kind, line.quantity),
    })
}

/// The error raised when a sale line asks for more than is on hand.
pub fn insufficient_stock(product: &Product, requested: i64) -> CoreError {
    CoreError::InsufficientStock {
        product: product.item.clone(),
        available: product.pieces,
        requested,
    }
}

// =============================================================================
// Totals + Assembly
// =============================================================================

/// Sum of `quantity × priceAtSale[currency]` over all lines.
///
/// Fails with `InvalidArgument` if a line value or the sum overflows.
pub fn total_of(lines: &[LineItem], currency: Currency) -> CoreResult<CurrencyAmount> {
    let amount = lines.iter().try_fold(Money::zero(), |sum, line| {
        line.price_at_sale
            .for_currency(currency)
            .checked_multiply_quantity(line.quantity)
            .and_then(|value| sum.checked_add(value))
            .ok_or_else(|| CoreError::invalid(format!("Transaction total in {currency} is too large")))
    })?;
    Ok(CurrencyAmount::new(currency, amount))
}

/// Assembles the immutable transaction record.
pub fn build_transaction(
    id: String,
    request: &PostRequest,
    lines: Vec<LineItem>,
    now: DateTime<Utc>,
) -> CoreResult<Transaction> {
    let total = total_of(&lines, request.currency)?;
    Ok(Transaction {
        id,
        date: request.date.unwrap_or(now),
        kind: request.kind,
        store: request.store.clone(),
        products_sold: lines,
        total,
        created_at: now,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::MAX_LINE_ITEMS;

    fn widget(pieces: i64) -> Product {
        Product {
            id: "p-widget".to_string(),
            store: "A".to_string(),
            item: "Widget".to_string(),
            measurement: None,
            product_type: None,
            category: None,
            price_lrd: Money::from_cents(100),
            price_usd: Money::from_cents(1),
            pieces,
            cts: None,
            image: None,
            created_at: Utc::now(),
        }
    }

    fn request(lines: Vec<LineRequest>) -> PostRequest {
        PostRequest {
            store: " A ".to_string(),
            kind: TransactionType::Sale,
            currency: Currency::Usd,
            date: None,
            lines,
        }
    }

    fn line(quantity: i64) -> LineRequest {
        LineRequest {
            product_id: "p-widget".to_string(),
            quantity,
        }
    }

    #[test]
    fn test_validate_trims_store_and_checks_lines() {
        let req = request(vec![line(3)]).validate().unwrap();
        assert_eq!(req.store, "A");

        assert!(request(vec![]).validate().is_err());
        assert!(request(vec![line(0)]).validate().is_err());
        assert!(request(vec![line(1); MAX_LINE_ITEMS + 1]).validate().is_err());

        let mut blank = request(vec![line(1)]);
        blank.lines[0].product_id = "  ".to_string();
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_plan_sale_line_snapshots_prices() {
        let planned = plan_line(&widget(10), &line(3), TransactionType::Sale).unwrap();
        assert_eq!(planned.change, StockChange::Decrement(3));
        assert_eq!(planned.change.delta(), -3);
        assert_eq!(planned.item.product_name, "Widget");
        assert_eq!(planned.item.price_at_sale.usd.cents(), 1);
        assert_eq!(planned.item.price_at_sale.lrd.cents(), 100);
    }

    #[test]
    fn test_plan_sale_line_rejects_short_stock() {
        let err = plan_line(&widget(2), &line(3), TransactionType::Sale).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                product,
                available,
                requested,
            } => {
                assert_eq!(product, "Widget");
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_restock_ignores_current_stock() {
        let planned = plan_line(&widget(0), &line(50), TransactionType::Restock).unwrap();
        assert_eq!(planned.change, StockChange::Increment(50));
    }

    #[test]
    fn test_widget_total_only_in_requested_currency() {
        let req = request(vec![line(3)]).validate().unwrap();
        let planned = plan_line(&widget(10), &req.lines[0], req.kind).unwrap();
        let now = Utc::now();
        let tx = build_transaction("tx-1".to_string(), &req, vec![planned.item], now).unwrap();

        assert_eq!(tx.total_usd().cents(), 3);
        assert_eq!(tx.total_lrd().cents(), 0);
        assert_eq!(tx.date, now);
        assert_eq!(tx.created_at, now);
    }

    #[test]
    fn test_total_sums_lines_in_currency() {
        let a = plan_line(&widget(10), &line(2), TransactionType::Sale).unwrap().item;
        let b = plan_line(&widget(10), &line(5), TransactionType::Sale).unwrap().item;
        let total = total_of(&[a, b], Currency::Lrd).unwrap();
        assert_eq!(total, CurrencyAmount::new(Currency::Lrd, Money::from_cents(700)));
    }

    #[test]
    fn test_total_overflow_is_rejected() {
        let mut pricey = widget(10);
        pricey.price_usd = Money::from_cents(i64::MAX / 2);

        let req = request(vec![line(3)]).validate().unwrap();
        let planned = plan_line(&pricey, &req.lines[0], req.kind).unwrap();

        assert!(matches!(total_of(&[planned.item.clone()], Currency::Usd), Err(CoreError::InvalidArgument(_))));
        assert!(build_transaction("tx-1".to_string(), &req, vec![planned.item.clone(), planned.item], Utc::now()).is_err());
    }

    #[test]
    fn test_restock_past_stock_limit_is_rejected() {
        let err = plan_line(&widget(MAX_STOCK_COUNT - 10), &line(11), TransactionType::Restock).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));

        let full = plan_line(&widget(MAX_STOCK_COUNT - 10), &line(10), TransactionType::Restock).unwrap();
        assert_eq!(full.change, StockChange::Increment(10));

        assert!(plan_line(&widget(i64::MAX), &line(1), TransactionType::Restock).is_err());
    }
}
