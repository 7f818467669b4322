//! # Report Folds
//!
//! Pure aggregation over transactions already fetched for a window.
//!
//! ## Fold Outputs
//! ```text
//!   transactions (any order)
//!          │
//!          ├──► dailyTotals    per UTC day      newest day first
//!          ├──► productTotals  per name(+store) most sold first
//!          ├──► storeTotals    per store        by store name (all stores only)
//!          └──► overallTotals  grand sums
//! ```
//!
//! Every fold credits a transaction's amounts only to its own currency, and
//! every fold is independent of input order: buckets live in ordered maps
//! and every sort has a total tie-break.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{DualTotals, Money};
use crate::period::Period;
use crate::types::{Transaction, TransactionType};

// =============================================================================
// Scope
// =============================================================================

/// Which stores a report covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportScope {
    Store(String),
    AllStores,
}

impl ReportScope {
    /// Picks the scope from request parameters.
    ///
    /// `allStores` wins over `store`. With neither, the configured default
    /// store is used; without one the request is rejected.
    pub fn resolve(store: Option<&str>, all_stores: bool, default_store: Option<&str>) -> CoreResult<Self> {
        if all_stores {
            return Ok(ReportScope::AllStores);
        }

        store
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or(default_store)
            .map(|s| ReportScope::Store(s.to_string()))
            .ok_or_else(|| CoreError::invalid("Store parameter is required unless allStores is true"))
    }

    pub fn store(&self) -> Option<&str> {
        match self {
            ReportScope::Store(store) => Some(store),
            ReportScope::AllStores => None,
        }
    }

    pub fn is_all_stores(&self) -> bool {
        matches!(self, ReportScope::AllStores)
    }
}

// =============================================================================
// Output Rows
// =============================================================================

/// Sales of one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DailyTotal {
    /// ISO date, `YYYY-MM-DD`.
    pub date: String,
    #[serde(rename = "totalLRD")]
    pub total_lrd: Money,
    #[serde(rename = "totalUSD")]
    pub total_usd: Money,
    pub transactions: i64,
    pub items: i64,
}

/// Sales of one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StoreTotal {
    pub store: String,
    #[serde(rename = "totalLRD")]
    pub total_lrd: Money,
    #[serde(rename = "totalUSD")]
    pub total_usd: Money,
    pub transactions: i64,
    pub items: i64,
}

/// Sales of one product name (per store in all-stores mode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductTotal {
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    pub quantity_sold: i64,
    #[serde(rename = "totalLRD")]
    pub total_lrd: Money,
    #[serde(rename = "totalUSD")]
    pub total_usd: Money,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OverallTotals {
    #[serde(rename = "totalLRD")]
    pub total_lrd: Money,
    #[serde(rename = "totalUSD")]
    pub total_usd: Money,
    pub total_items: i64,
    pub total_transactions: i64,
}

/// The folded part of a sales report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub daily_totals: Vec<DailyTotal>,
    pub product_totals: Vec<ProductTotal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_totals: Option<Vec<StoreTotal>>,
    pub overall_totals: OverallTotals,
}

/// A complete sales report: window, scope, the transactions (newest first)
/// and their summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    pub all_stores: bool,
    pub transactions: Vec<Transaction>,
    #[serde(flatten)]
    pub summary: SalesSummary,
}

// =============================================================================
// Tallies
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    totals: DualTotals,
    transactions: i64,
    items: i64,
}

impl Tally {
    fn add(&mut self, tx: &Transaction) {
        self.totals.credit(tx.total);
        self.transactions += 1;
        self.items += tx.item_count();
    }
}

fn is_sale(tx: &&Transaction) -> bool {
    tx.kind == TransactionType::Sale
}

fn daily_totals<'a>(transactions: impl Iterator<Item = &'a Transaction>) -> Vec<DailyTotal> {
    let mut days: BTreeMap<NaiveDate, Tally> = BTreeMap::new();
    for tx in transactions {
        days.entry(tx.date.date_naive()).or_default().add(tx);
    }

    days.into_iter()
        .rev()
        .map(|(day, tally)| DailyTotal {
            date: day.format("%Y-%m-%d").to_string(),
            total_lrd: tally.totals.total_lrd,
            total_usd: tally.totals.total_usd,
            transactions: tally.transactions,
            items: tally.items,
        })
        .collect()
}

// =============================================================================
// Sales Report Fold
// =============================================================================

/// Folds sale transactions into daily, product, store and overall totals.
///
/// Restock transactions in the input are ignored.
///
/// ## Example
/// Two LRD sales on one day, totals 500 and 300 with 2 and 1 items, fold to
/// one daily bucket `{totalLRD: 800, totalUSD: 0, transactions: 2, items: 3}`.
pub fn summarize(transactions: &[Transaction], scope: &ReportScope) -> SalesSummary {
    let all_stores = scope.is_all_stores();

    let mut overall = Tally::default();
    let mut stores: BTreeMap<&str, Tally> = BTreeMap::new();
    let mut products: BTreeMap<(&str, Option<&str>), (i64, DualTotals)> = BTreeMap::new();

    for tx in transactions.iter().filter(is_sale) {
        overall.add(tx);

        if all_stores {
            stores.entry(tx.store.as_str()).or_default().add(tx);
        }

        let store_key = all_stores.then_some(tx.store.as_str());
        for line in &tx.products_sold {
            let entry = products.entry((line.product_name.as_str(), store_key)).or_default();
            entry.0 += line.quantity;
            entry.1.credit(line.value_in(tx.currency()));
        }
    }

    let mut product_totals: Vec<ProductTotal> = products
        .into_iter()
        .map(|((name, store), (quantity, totals))| ProductTotal {
            product_name: name.to_string(),
            store: store.map(str::to_string),
            quantity_sold: quantity,
            total_lrd: totals.total_lrd,
            total_usd: totals.total_usd,
        })
        .collect();
    // Stable sort keeps the (name, store) map order for equal quantities.
    product_totals.sort_by(|a, b| b.quantity_sold.cmp(&a.quantity_sold));

    let store_totals = all_stores.then(|| {
        stores
            .into_iter()
            .map(|(store, tally)| StoreTotal {
                store: store.to_string(),
                total_lrd: tally.totals.total_lrd,
                total_usd: tally.totals.total_usd,
                transactions: tally.transactions,
                items: tally.items,
            })
            .collect()
    });

    SalesSummary {
        daily_totals: daily_totals(transactions.iter().filter(is_sale)),
        product_totals,
        store_totals,
        overall_totals: OverallTotals {
            total_lrd: overall.totals.total_lrd,
            total_usd: overall.totals.total_usd,
            total_items: overall.items,
            total_transactions: overall.transactions,
        },
    }
}

// =============================================================================
// Per-Product Sales
// =============================================================================

/// Line-level sales of one product id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductSales {
    pub quantity: i64,
    pub totals: DualTotals,
    /// Distinct transactions containing the product.
    pub transactions: i64,
}

/// Groups the lines of sale transactions by product id.
pub fn product_sales(transactions: &[Transaction]) -> BTreeMap<String, ProductSales> {
    let mut sales: BTreeMap<String, ProductSales> = BTreeMap::new();

    for tx in transactions.iter().filter(is_sale) {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for line in &tx.products_sold {
            let entry = sales.entry(line.product.clone()).or_default();
            entry.quantity += line.quantity;
            entry.totals.credit(line.value_in(tx.currency()));
            if seen.insert(line.product.as_str()) {
                entry.transactions += 1;
            }
        }
    }

    sales
}

/// One row of the top-products ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TopProduct {
    pub product_id: String,
    /// Current catalog name.
    pub item: String,
    pub total_quantity: i64,
    #[serde(rename = "totalSalesLRD")]
    pub total_sales_lrd: Money,
    #[serde(rename = "totalSalesUSD")]
    pub total_sales_usd: Money,
    pub transactions: i64,
}

/// Ranks products by quantity sold and keeps the first `limit`.
///
/// `current_name` maps a product id to its current catalog name; products
/// it does not know are dropped.
pub fn rank_top_products<F>(sales: BTreeMap<String, ProductSales>, current_name: F, limit: usize) -> Vec<TopProduct>
where
    F: Fn(&str) -> Option<String>,
{
    let mut ranked: Vec<TopProduct> = sales
        .into_iter()
        .filter_map(|(product_id, sales)| {
            let item = current_name(&product_id)?;
            Some(TopProduct {
                product_id,
                item,
                total_quantity: sales.quantity,
                total_sales_lrd: sales.totals.total_lrd,
                total_sales_usd: sales.totals.total_usd,
                transactions: sales.transactions,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.total_quantity
            .cmp(&a.total_quantity)
            .then_with(|| a.item.cmp(&b.item))
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    ranked.truncate(limit);
    ranked
}

/// Lifetime sales attached to a product listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductSalesTotals {
    #[serde(rename = "totalLRD")]
    pub total_lrd: Money,
    #[serde(rename = "totalUSD")]
    pub total_usd: Money,
    pub total_quantity_sold: i64,
}

impl From<&ProductSales> for ProductSalesTotals {
    fn from(sales: &ProductSales) -> Self {
        ProductSalesTotals {
            total_lrd: sales.totals.total_lrd,
            total_usd: sales.totals.total_usd,
            total_quantity_sold: sales.quantity,
        }
    }
}

// =============================================================================
// Product History
// =============================================================================

/// Totals of one product's lines across its sale history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductHistoryTotals {
    #[serde(rename = "totalLRD")]
    pub total_lrd: Money,
    #[serde(rename = "totalUSD")]
    pub total_usd: Money,
    pub total_quantity: i64,
    pub total_transactions: i64,
}

/// Counts only the lines of `product_id`, credited per transaction currency.
pub fn product_history_totals(transactions: &[Transaction], product_id: &str) -> ProductHistoryTotals {
    let sales = product_sales(transactions);
    match sales.get(product_id) {
        Some(sales) => ProductHistoryTotals {
            total_lrd: sales.totals.total_lrd,
            total_usd: sales.totals.total_usd,
            total_quantity: sales.quantity,
            total_transactions: sales.transactions,
        },
        None => ProductHistoryTotals::default(),
    }
}

// =============================================================================
// Date Range
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RangeTotals {
    #[serde(rename = "totalLRD")]
    pub total_lrd: Money,
    #[serde(rename = "totalUSD")]
    pub total_usd: Money,
    pub total_items: i64,
    pub total_transactions: i64,
}

/// Totals and per-day breakdown of a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeSummary {
    pub totals: RangeTotals,
    pub daily_totals: Vec<DailyTotal>,
}

pub fn range_summary(transactions: &[Transaction]) -> RangeSummary {
    let mut overall = Tally::default();
    for tx in transactions.iter().filter(is_sale) {
        overall.add(tx);
    }

    RangeSummary {
        totals: RangeTotals {
            total_lrd: overall.totals.total_lrd,
            total_usd: overall.totals.total_usd,
            total_items: overall.items,
            total_transactions: overall.transactions,
        },
        daily_totals: daily_totals(transactions.iter().filter(is_sale)),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
