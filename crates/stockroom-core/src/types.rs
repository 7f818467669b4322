//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌─────────────────┐      │
//! │  │    Product      │   │   Transaction    │   │      User       │      │
//! │  │  ─────────────  │   │  ──────────────  │   │  ─────────────  │      │
//! │  │  id (UUID)      │   │  id (UUID)       │   │  id (UUID)      │      │
//! │  │  store + item   │   │  store, date     │   │  username       │      │
//! │  │  priceLRD/USD   │   │  type, currency  │   │  role           │      │
//! │  │  pieces         │   │  total (tagged)  │   │  store          │      │
//! │  └─────────────────┘   │  productsSold[]  │   └─────────────────┘      │
//! │                        └────────┬─────────┘                             │
//! │                                 │                                       │
//! │                        ┌────────▼─────────┐                             │
//! │                        │    LineItem      │  snapshot of name + both   │
//! │                        │  product (weak)  │  prices at posting time    │
//! │                        └──────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A line item references its product by id only, and copies the item name
//! and both prices at the moment of posting. Reports read the copies, so
//! history stays stable when a product is renamed or repriced later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{Currency, CurrencyAmount, Money};
use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

// =============================================================================
// Category
// =============================================================================

/// Product category grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum Category {
    A,
    B,
    C,
}

// =============================================================================
// Product
// =============================================================================

/// A product in one store's catalog.
///
/// `(store, item)` is unique. `pieces` is the current stock count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Store (tenant) this product belongs to.
    pub store: String,

    /// Display name, unique within the store.
    pub item: String,

    /// Unit of measure ("bag", "carton", "25kg", ...).
    pub measurement: Option<String>,

    /// Free-form product type.
    #[serde(rename = "type")]
    pub product_type: Option<String>,

    pub category: Option<Category>,

    #[serde(rename = "priceLRD")]
    pub price_lrd: Money,

    #[serde(rename = "priceUSD")]
    pub price_usd: Money,

    /// Current stock level.
    pub pieces: i64,

    /// Carton count.
    pub cts: Option<i64>,

    /// Stored image reference (path or URL).
    pub image: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Freezes both current prices for a line item.
    pub fn price_snapshot(&self) -> PriceSnapshot {
        PriceSnapshot {
            usd: self.price_usd,
            lrd: self.price_lrd,
        }
    }

    /// Checks if the product has enough stock for a sale of `quantity`.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.pieces >= quantity
    }
}

/// Fields for a new catalog product. The id and `createdAt` are generated.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewProduct {
    pub store: String,
    pub item: String,
    #[serde(default)]
    pub measurement: Option<String>,
    #[serde(default, rename = "type")]
    pub product_type: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default, rename = "priceLRD")]
    pub price_lrd: Money,
    #[serde(default, rename = "priceUSD")]
    pub price_usd: Money,
    #[serde(default)]
    pub pieces: i64,
    #[serde(default)]
    pub cts: Option<i64>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A partial product update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductPatch {
    pub store: Option<String>,
    pub item: Option<String>,
    pub measurement: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub category: Option<Category>,
    #[serde(rename = "priceLRD")]
    pub price_lrd: Option<Money>,
    #[serde(rename = "priceUSD")]
    pub price_usd: Option<Money>,
    pub pieces: Option<i64>,
    pub cts: Option<i64>,
    pub image: Option<String>,
}

impl ProductPatch {
    /// Applies the patch onto an existing product.
    pub fn apply_to(self, product: &mut Product) {
        if let Some(store) = self.store {
            product.store = store.trim().to_string();
        }
        if let Some(item) = self.item {
            product.item = item.trim().to_string();
        }
        if self.measurement.is_some() {
            product.measurement = self.measurement;
        }
        if self.product_type.is_some() {
            product.product_type = self.product_type;
        }
        if self.category.is_some() {
            product.category = self.category;
        }
        if let Some(price) = self.price_lrd {
            product.price_lrd = price;
        }
        if let Some(price) = self.price_usd {
            product.price_usd = price;
        }
        if let Some(pieces) = self.pieces {
            product.pieces = pieces;
        }
        if self.cts.is_some() {
            product.cts = self.cts;
        }
        if self.image.is_some() {
            product.image = self.image;
        }
    }
}

// =============================================================================
// Transaction Type
// =============================================================================

/// Whether a transaction sells stock or brings it in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TransactionType {
    /// Stock leaves the store. Counts toward every sales report.
    #[default]
    Sale,
    /// Stock arrives. Older clients call this "purchase".
    #[serde(alias = "purchase")]
    Restock,
}

impl TransactionType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Sale => "sale",
            TransactionType::Restock => "restock",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// Both unit prices of a product, frozen at posting time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceSnapshot {
    #[serde(rename = "USD")]
    pub usd: Money,
    #[serde(rename = "LRD")]
    pub lrd: Money,
}

impl PriceSnapshot {
    #[inline]
    pub fn for_currency(&self, currency: Currency) -> Money {
        match currency {
            Currency::Lrd => self.lrd,
            Currency::Usd => self.usd,
        }
    }
}

/// One product + quantity entry of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineItem {
    /// Product id at posting time (weak reference).
    pub product: String,
    /// Item name at posting time (frozen).
    pub product_name: String,
    pub quantity: i64,
    pub price_at_sale: PriceSnapshot,
}

impl LineItem {
    /// Value of this line in the given currency: `quantity × priceAtSale[currency]`.
    #[inline]
    pub fn value_in(&self, currency: Currency) -> CurrencyAmount {
        CurrencyAmount::new(
            currency,
            self.price_at_sale.for_currency(currency).multiply_quantity(self.quantity),
        )
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// An immutable posted transaction.
///
/// The total is tagged with its currency. On the wire it is projected to the
/// `totalLRD` / `totalUSD` pair, where the field of the other currency is 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "TransactionJson", try_from = "TransactionJson")]
pub struct Transaction {
    pub id: String,
    pub date: DateTime<Utc>,
    pub kind: TransactionType,
    pub store: String,
    pub products_sold: Vec<LineItem>,
    pub total: CurrencyAmount,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    #[inline]
    pub fn currency(&self) -> Currency {
        self.total.currency
    }

    #[inline]
    pub fn total_lrd(&self) -> Money {
        self.total.amount_in(Currency::Lrd)
    }

    #[inline]
    pub fn total_usd(&self) -> Money {
        self.total.amount_in(Currency::Usd)
    }

    /// Sum of line quantities.
    pub fn item_count(&self) -> i64 {
        self.products_sold.iter().map(|line| line.quantity).sum()
    }
}

/// Wire shape of [`Transaction`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, rename = "Transaction")]
pub struct TransactionJson {
    pub id: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub currency: Currency,
    pub store: String,
    pub products_sold: Vec<LineItem>,
    #[serde(rename = "totalLRD", default)]
    pub total_lrd: Money,
    #[serde(rename = "totalUSD", default)]
    pub total_usd: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionJson {
    fn from(tx: Transaction) -> Self {
        TransactionJson {
            total_lrd: tx.total_lrd(),
            total_usd: tx.total_usd(),
            currency: tx.total.currency,
            id: tx.id,
            date: tx.date,
            kind: tx.kind,
            store: tx.store,
            products_sold: tx.products_sold,
            created_at: tx.created_at,
        }
    }
}

impl TryFrom<TransactionJson> for Transaction {
    type Error = ValidationError;

    fn try_from(json: TransactionJson) -> Result<Self, Self::Error> {
        let (amount, other) = match json.currency {
            Currency::Lrd => (json.total_lrd, json.total_usd),
            Currency::Usd => (json.total_usd, json.total_lrd),
        };
        if !other.is_zero() {
            return Err(ValidationError::InvalidFormat {
                field: "total".to_string(),
                reason: format!("only the {} total may be set", json.currency),
            });
        }

        Ok(Transaction {
            id: json.id,
            date: json.date,
            kind: json.kind,
            store: json.store,
            products_sold: json.products_sold,
            total: CurrencyAmount::new(json.currency, amount),
            created_at: json.created_at,
        })
    }
}

// =============================================================================
// Users
// =============================================================================

/// Role of a store user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    #[default]
    Employee,
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(Role::Admin),
            "employee" => Ok(Role::Employee),
            _ => Err(ValidationError::NotAllowed {
                field: "userType".to_string(),
                allowed: vec!["admin".to_string(), "employee".to_string()],
            }),
        }
    }
}

/// A store user as exposed to callers. The password hash never leaves the
/// database layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(rename = "userType")]
    pub role: Role,
    pub store: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl User {
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// A requested page, clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// `page` defaults to 1, `limit` to DEFAULT_PAGE_SIZE and is capped at
    /// MAX_PAGE_SIZE.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        PageRequest {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows to skip.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::new(None, None)
    }
}

/// Pagination envelope returned with listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub limit: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total_items: i64) -> Self {
        let total_pages = (total_items + request.limit - 1) / request.limit;
        Pagination {
            current_page: request.page,
            total_pages,
            total_items,
            has_next_page: request.page < total_pages,
            has_prev_page: request.page > 1,
            limit: request.limit,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_transaction(currency: Currency, cents: i64) -> Transaction {
        let at = Utc.with_ymd_and_hms(2024, 3, 6, 10, 0, 0).unwrap();
        Transaction {
            id: "tx-1".to_string(),
            date: at,
            kind: TransactionType::Sale,
            store: "A".to_string(),
            products_sold: vec![LineItem {
                product: "p-1".to_string(),
                product_name: "Widget".to_string(),
                quantity: 3,
                price_at_sale: PriceSnapshot {
                    usd: Money::from_cents(1),
                    lrd: Money::from_cents(100),
                },
            }],
            total: CurrencyAmount::new(currency, Money::from_cents(cents)),
            created_at: at,
        }
    }

    #[test]
    fn test_transaction_serializes_two_field_totals() {
        let tx = sample_transaction(Currency::Usd, 3);
        let json = serde_json::to_value(&tx).unwrap();

        assert_eq!(json["currency"], "USD");
        assert_eq!(json["type"], "sale");
        assert_eq!(json["totalUSD"], 3);
        assert_eq!(json["totalLRD"], 0);
        assert_eq!(json["productsSold"][0]["priceAtSale"]["LRD"], 100);
        assert_eq!(json["productsSold"][0]["productName"], "Widget");
    }

    #[test]
    fn test_transaction_round_trips_through_wire_shape() {
        let tx = sample_transaction(Currency::Lrd, 300);
        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn test_transaction_rejects_total_in_other_currency() {
        let mut json = serde_json::to_value(sample_transaction(Currency::Lrd, 300)).unwrap();
        json["totalUSD"] = serde_json::json!(5);
        assert!(serde_json::from_value::<Transaction>(json).is_err());
    }

    #[test]
    fn test_purchase_is_accepted_as_restock() {
        let kind: TransactionType = serde_json::from_str("\"purchase\"").unwrap();
        assert_eq!(kind, TransactionType::Restock);
        assert_eq!(TransactionType::default(), TransactionType::Sale);
    }

    #[test]
    fn test_line_value_uses_snapshot_price() {
        let tx = sample_transaction(Currency::Lrd, 300);
        let line = &tx.products_sold[0];
        assert_eq!(line.value_in(Currency::Lrd).amount.cents(), 300);
        assert_eq!(line.value_in(Currency::Usd).amount.cents(), 3);
        assert_eq!(tx.item_count(), 3);
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut product = Product {
            id: "p-1".to_string(),
            store: "A".to_string(),
            item: "Widget".to_string(),
            measurement: Some("box".to_string()),
            product_type: None,
            category: Some(Category::A),
            price_lrd: Money::from_cents(100),
            price_usd: Money::from_cents(1),
            pieces: 10,
            cts: None,
            image: None,
            created_at: Utc::now(),
        };

        let patch = ProductPatch {
            price_usd: Some(Money::from_cents(2)),
            pieces: Some(4),
            ..Default::default()
        };
        patch.apply_to(&mut product);

        assert_eq!(product.price_usd.cents(), 2);
        assert_eq!(product.pieces, 4);
        assert_eq!(product.measurement.as_deref(), Some("box"));
        assert_eq!(product.price_lrd.cents(), 100);
    }

    #[test]
    fn test_page_request_clamps() {
        let page = PageRequest::new(Some(0), Some(1000));
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, MAX_PAGE_SIZE);
        assert_eq!(PageRequest::default().limit, DEFAULT_PAGE_SIZE);
        assert_eq!(PageRequest::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn test_pagination_envelope() {
        let envelope = Pagination::new(PageRequest::new(Some(2), Some(10)), 25);
        assert_eq!(envelope.total_pages, 3);
        assert!(envelope.has_next_page);
        assert!(envelope.has_prev_page);

        let empty = Pagination::new(PageRequest::default(), 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
        assert!(!empty.has_prev_page);

        let json = serde_json::to_value(envelope).unwrap();
        assert_eq!(json["currentPage"], 2);
        assert_eq!(json["hasNextPage"], true);
    }

    #[test]
    fn test_role_parse_and_wire_name() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("owner".parse::<Role>().is_err());

        let user = User {
            id: "u-1".to_string(),
            username: "ama".to_string(),
            role: Role::Admin,
            store: "A".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["userType"], "admin");
        assert!(json.get("passwordHash").is_none());
    }
}
