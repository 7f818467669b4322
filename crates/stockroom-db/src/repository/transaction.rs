//! # Transaction Repository
//!
//! The posting engine and the ledger reads.
//!
//! ## Posting: All Lines or None
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN IMMEDIATE                                                        │
//! │   │                                                                     │
//! │   ├─ line 1: SELECT product (id, store) → plan_line → guarded UPDATE   │
//! │   ├─ line 2: SELECT product (id, store) → plan_line → guarded UPDATE   │
//! │   ├─ line 3: ✗ InsufficientStock                                       │
//! │   │                                                                     │
//! │   └─ ROLLBACK  ← lines 1 and 2 stock changes are undone                │
//! │                                                                         │
//! │  Guarded decrement (one statement, no read-modify-write):              │
//! │    UPDATE products SET pieces = pieces - q                             │
//! │    WHERE id = ? AND store = ? AND pieces >= q                          │
//! │    rows_affected == 0  →  InsufficientStock                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `BEGIN IMMEDIATE` takes the write lock before the first read. A deferred
//! transaction would upgrade from reader to writer at the first `UPDATE`, and
//! SQLite fails that upgrade with SQLITE_BUSY without consulting
//! `busy_timeout`.
//!
//! The ledger is append-only: nothing here updates or deletes a posted
//! transaction.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use super::product::fetch_in_store;
use super::{from_millis, to_millis};
use crate::error::{DbError, DbResult};
use stockroom_core::period::DateWindow;
use stockroom_core::posting::{build_transaction, insufficient_stock, plan_line, PostRequest, StockChange};
use stockroom_core::{
    new_id, CoreError, Currency, CurrencyAmount, LineItem, Money, PriceSnapshot, Product, Transaction,
    TransactionType,
};

// =============================================================================
// Ledger Filter
// =============================================================================

/// Selects transactions from the ledger. Empty filter = everything.
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub store: Option<String>,
    pub kind: Option<TransactionType>,
    pub window: Option<DateWindow>,
    pub product_id: Option<String>,
}

impl LedgerFilter {
    pub fn new() -> Self {
        LedgerFilter::default()
    }

    /// Restricts to one store. Blank store names are ignored.
    pub fn store(mut self, store: Option<&str>) -> Self {
        self.store = store.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        self
    }

    pub fn sales_only(mut self) -> Self {
        self.kind = Some(TransactionType::Sale);
        self
    }

    pub fn window(mut self, window: DateWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Transactions with at least one line for the product.
    pub fn product(mut self, product_id: &str) -> Self {
        self.product_id = Some(product_id.to_string());
        self
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

/// One transaction line joined with its transaction header.
#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    id: String,
    store: String,
    kind: TransactionType,
    currency: Currency,
    total: i64,
    date_ms: i64,
    created_at_ms: i64,
    product_id: String,
    product_name: String,
    quantity: i64,
    price_usd: i64,
    price_lrd: i64,
}

impl LedgerRow {
    fn line(&self) -> LineItem {
        LineItem {
            product: self.product_id.clone(),
            product_name: self.product_name.clone(),
            quantity: self.quantity,
            price_at_sale: PriceSnapshot {
                usd: Money::from_cents(self.price_usd),
                lrd: Money::from_cents(self.price_lrd),
            },
        }
    }

    fn header(&self) -> DbResult<Transaction> {
        Ok(Transaction {
            id: self.id.clone(),
            date: from_millis(self.date_ms)?,
            kind: self.kind,
            store: self.store.clone(),
            products_sold: Vec::new(),
            total: CurrencyAmount::new(self.currency, Money::from_cents(self.total)),
            created_at: from_millis(self.created_at_ms)?,
        })
    }
}

/// Folds consecutive rows of the same transaction into one record.
fn assemble(rows: Vec<LedgerRow>) -> DbResult<Vec<Transaction>> {
    let mut transactions: Vec<Transaction> = Vec::new();

    for row in rows {
        match transactions.last_mut() {
            Some(current) if current.id == row.id => current.products_sold.push(row.line()),
            _ => {
                let mut tx = row.header()?;
                tx.products_sold.push(row.line());
                transactions.push(tx);
            }
        }
    }

    Ok(transactions)
}

/// Loads transactions matching the filter, newest first.
pub(crate) async fn fetch_ledger(pool: &SqlitePool, filter: &LedgerFilter) -> DbResult<Vec<Transaction>> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT
            t.id, t.store, t.kind, t.currency, t.total, t.date_ms, t.created_at_ms,
            l.product_id, l.product_name, l.quantity, l.price_usd, l.price_lrd
        FROM transactions t
        INNER JOIN transaction_lines l ON l.transaction_id = t.id
        WHERE 1 = 1
        "#,
    );

    if let Some(store) = &filter.store {
        query.push(" AND t.store = ").push_bind(store);
    }
    if let Some(kind) = filter.kind {
        query.push(" AND t.kind = ").push_bind(kind);
    }
    if let Some(window) = &filter.window {
        query
            .push(" AND t.date_ms >= ")
            .push_bind(to_millis(window.start))
            .push(" AND t.date_ms <= ")
            .push_bind(to_millis(window.end));
    }
    if let Some(product_id) = &filter.product_id {
        query
            .push(" AND t.id IN (SELECT transaction_id FROM transaction_lines WHERE product_id = ")
            .push_bind(product_id)
            .push(")");
    }
    query.push(" ORDER BY t.date_ms DESC, t.id DESC, l.position ASC");

    let rows = query.build_query_as::<LedgerRow>().fetch_all(pool).await?;
    let transactions = assemble(rows)?;

    debug!(count = transactions.len(), "Ledger query returned transactions");
    Ok(transactions)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for posting and reading transactions.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Posts a sale or restock.
    ///
    /// Validates the request, then runs every line inside one database
    /// transaction. Any failure rolls back all stock changes made by earlier
    /// lines and persists nothing.
    ///
    /// ## Errors
    /// * `Domain(Validation)` - empty store, no lines, bad quantity
    /// * `Domain(ProductNotFound)` - id unknown in the request's store
    /// * `Domain(InsufficientStock)` - a sale line exceeds stock
    /// * `Domain(InvalidArgument)` - a restock past the stock limit, or a total
    ///   that does not fit in an i64
    pub async fn post(&self, request: PostRequest) -> DbResult<Transaction> {
        let mut request = request.validate()?;
        request.date = request.date.map(truncate_to_millis).transpose()?;

        debug!(
            store = %request.store,
            kind = %request.kind,
            currency = %request.currency,
            lines = request.lines.len(),
            "Posting transaction"
        );

        let mut db_tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        match post_lines(&mut *db_tx, &request).await {
            Ok(transaction) => {
                db_tx
                    .commit()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

                info!(
                    id = %transaction.id,
                    store = %transaction.store,
                    total = %transaction.total,
                    "Transaction posted"
                );
                Ok(transaction)
            }
            Err(err) => {
                if let Err(rollback_err) = db_tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                warn!(store = %request.store, error = %err, "Posting rejected");
                Err(err)
            }
        }
    }

    /// Gets a transaction by ID, failing with `TransactionNotFound`.
    pub async fn get(&self, id: &str) -> DbResult<Transaction> {
        let rows = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT
                t.id, t.store, t.kind, t.currency, t.total, t.date_ms, t.created_at_ms,
                l.product_id, l.product_name, l.quantity, l.price_usd, l.price_lrd
            FROM transactions t
            INNER JOIN transaction_lines l ON l.transaction_id = t.id
            WHERE t.id = ?1
            ORDER BY l.position ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        assemble(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()).into())
    }

    /// All transactions (any type), newest first, optionally for one store.
    pub async fn list(&self, store: Option<&str>) -> DbResult<Vec<Transaction>> {
        fetch_ledger(&self.pool, &LedgerFilter::new().store(store)).await
    }

    /// All transactions (any type) on one UTC calendar day, newest first.
    pub async fn by_date(&self, day: NaiveDate, store: Option<&str>) -> DbResult<Vec<Transaction>> {
        let filter = LedgerFilter::new().store(store).window(DateWindow::day(day));
        fetch_ledger(&self.pool, &filter).await
    }

    /// Counts transactions (for diagnostics and the seed tool).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Posting Steps
// =============================================================================

async fn post_lines(conn: &mut SqliteConnection, request: &PostRequest) -> DbResult<Transaction> {
    let mut lines = Vec::with_capacity(request.lines.len());

    for line in &request.lines {
        let product = fetch_in_store(&mut *conn, &line.product_id, &request.store)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

        let planned = plan_line(&product, line, request.kind)?;
        apply_stock_change(conn, &product, planned.change).await?;
        lines.push(planned.item);
    }

    let now = truncate_to_millis(Utc::now())?;
    let transaction = build_transaction(new_id(), request, lines, now)?;
    insert_transaction(conn, &transaction).await?;

    Ok(transaction)
}

async fn apply_stock_change(conn: &mut SqliteConnection, product: &Product, change: StockChange) -> DbResult<()> {
    let result = match change {
        StockChange::Decrement(quantity) => {
            sqlx::query("UPDATE products SET pieces = pieces - ?3 WHERE id = ?1 AND store = ?2 AND pieces >= ?3")
                .bind(&product.id)
                .bind(&product.store)
                .bind(quantity)
                .execute(&mut *conn)
                .await?
        }
        StockChange::Increment(quantity) => {
            sqlx::query("UPDATE products SET pieces = pieces + ?3 WHERE id = ?1 AND store = ?2")
                .bind(&product.id)
                .bind(&product.store)
                .bind(quantity)
                .execute(&mut *conn)
                .await?
        }
    };

    if result.rows_affected() == 0 {
        return Err(match change {
            StockChange::Decrement(quantity) => insufficient_stock(product, quantity),
            StockChange::Increment(_) => CoreError::ProductNotFound(product.id.clone()),
        }
        .into());
    }

    debug!(product = %product.id, delta = change.delta(), "Stock adjusted");
    Ok(())
}

async fn insert_transaction(conn: &mut SqliteConnection, transaction: &Transaction) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO transactions (id, store, kind, currency, total, date_ms, created_at_ms)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&transaction.id)
    .bind(&transaction.store)
    .bind(transaction.kind)
    .bind(transaction.currency())
    .bind(transaction.total.amount.cents())
    .bind(to_millis(transaction.date))
    .bind(to_millis(transaction.created_at))
    .execute(&mut *conn)
    .await?;

    for (position, line) in transaction.products_sold.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO transaction_lines (
                transaction_id, position, product_id, product_name, quantity, price_usd, price_lrd
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&transaction.id)
        .bind(position as i64)
        .bind(&line.product)
        .bind(&line.product_name)
        .bind(line.quantity)
        .bind(line.price_at_sale.usd.cents())
        .bind(line.price_at_sale.lrd.cents())
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Drops sub-millisecond precision so returned records equal stored ones.
pub(crate) fn truncate_to_millis(at: DateTime<Utc>) -> DbResult<DateTime<Utc>> {
    from_millis(to_millis(at))
}

// =============================================================================
// Tests
// =============================================================================
