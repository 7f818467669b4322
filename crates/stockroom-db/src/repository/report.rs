//! # Report Repository
//!
//! Read-side queries: fetch a filtered window of the ledger, then hand it to
//! the pure folds in `stockroom_core::report`.
//!
//! ```text
//! salesReport ──► WindowSpec::resolve ──► fetch_ledger(sales, window, scope)
//!                                                 │
//!                                                 ▼
//!                                          report::summarize
//! ```
//!
//! Nothing here writes, so repeating a query without intervening posts
//! returns the same result.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use super::product::ProductRepository;
use super::transaction::{fetch_ledger, LedgerFilter};
use crate::error::DbResult;
use stockroom_core::period::{DateWindow, WindowSpec};
use stockroom_core::report::{
    product_history_totals, product_sales, range_summary, rank_top_products, summarize, DailyTotal,
    ProductHistoryTotals, RangeTotals, ReportScope, SalesReport, TopProduct,
};
use stockroom_core::{Transaction, TOP_PRODUCTS_LIMIT};

/// Sale history of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductHistory {
    pub transactions: Vec<Transaction>,
    pub totals: ProductHistoryTotals,
}

/// Sales in an explicit date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeReport {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub transactions: Vec<Transaction>,
    pub totals: RangeTotals,
    pub daily_totals: Vec<DailyTotal>,
}

/// Repository for sales reporting.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Sales report for a period or an explicit range.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let spec = WindowSpec::from_params(Some("weekly"), Some("2024-03-06"), None, None, today)?;
    /// let report = db.reports().sales_report(spec, ReportScope::AllStores).await?;
    /// // report.start_date = Sun 2024-03-03 00:00, report.end_date = Sat 2024-03-09 23:59:59.999
    /// ```
    pub async fn sales_report(&self, spec: WindowSpec, scope: ReportScope) -> DbResult<SalesReport> {
        let window = spec.resolve()?;

        debug!(
            period = ?spec.period(),
            start = %window.start,
            end = %window.end,
            store = ?scope.store(),
            "Building sales report"
        );

        let filter = LedgerFilter::new().sales_only().window(window).store(scope.store());
        let transactions = fetch_ledger(&self.pool, &filter).await?;
        let summary = summarize(&transactions, &scope);

        Ok(SalesReport {
            period: spec.period(),
            start_date: window.start,
            end_date: window.end,
            store: scope.store().map(str::to_string),
            all_stores: scope.is_all_stores(),
            transactions,
            summary,
        })
    }

    /// Best-selling products in the window, by quantity, named by the
    /// current catalog. Products no longer in the catalog are skipped.
    pub async fn top_products(&self, window: DateWindow, store: Option<&str>) -> DbResult<Vec<TopProduct>> {
        let filter = LedgerFilter::new().sales_only().window(window).store(store);
        let transactions = fetch_ledger(&self.pool, &filter).await?;

        let sales = product_sales(&transactions);
        let ids: Vec<String> = sales.keys().cloned().collect();
        let names = ProductRepository::new(self.pool.clone()).names(&ids).await?;

        let ranked = rank_top_products(sales, |id| names.get(id).cloned(), TOP_PRODUCTS_LIMIT);
        debug!(count = ranked.len(), "Top products ranked");
        Ok(ranked)
    }

    /// Sale transactions containing the product, newest first, with totals
    /// over that product's lines only.
    pub async fn transactions_by_product(&self, product_id: &str, store: Option<&str>) -> DbResult<ProductHistory> {
        let filter = LedgerFilter::new().sales_only().product(product_id).store(store);
        let transactions = fetch_ledger(&self.pool, &filter).await?;
        let totals = product_history_totals(&transactions, product_id);

        Ok(ProductHistory { transactions, totals })
    }

    /// Sale transactions between two calendar days (inclusive), with totals
    /// and a per-day breakdown.
    pub async fn transactions_by_date_range(
        &self,
        first: NaiveDate,
        last: NaiveDate,
        store: Option<&str>,
    ) -> DbResult<RangeReport> {
        let window = DateWindow::days(first, last)?;
        let filter = LedgerFilter::new().sales_only().window(window).store(store);
        let transactions = fetch_ledger(&self.pool, &filter).await?;
        let summary = range_summary(&transactions);

        Ok(RangeReport {
            start_date: window.start,
            end_date: window.end,
            transactions,
            totals: summary.totals,
            daily_totals: summary.daily_totals,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
