//! # Product Repository
//!
//! Catalog operations: CRUD, store-scoped listing with pagination, and the
//! lifetime sales totals shown next to each product.
//!
//! ## Store Scoping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products                                                               │
//! │                                                                         │
//! │  store "Main"   | Rice 25kg | ...  ┐                                   │
//! │  store "Main"   | Oil 5L    | ...  ├─ UNIQUE (store, item)             │
//! │  store "Harbel" | Rice 25kg | ...  ┘  same item name, other store: ok  │
//! │                                                                         │
//! │  The posting engine looks products up by (id, store): an id from       │
//! │  another store is "not found" for that transaction.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info};

use super::{from_millis, to_millis};
use crate::error::{DbError, DbResult};
use stockroom_core::report::ProductSalesTotals;
use stockroom_core::validation::{validate_new_product, validate_product_patch};
use stockroom_core::{new_id, Category, CoreError, Money, NewProduct, PageRequest, Pagination, Product, ProductPatch};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: String,
    store: String,
    item: String,
    measurement: Option<String>,
    product_type: Option<String>,
    category: Option<Category>,
    price_lrd: i64,
    price_usd: i64,
    pieces: i64,
    cts: Option<i64>,
    image: Option<String>,
    created_at_ms: i64,
}

impl ProductRow {
    pub(crate) fn into_product(self) -> DbResult<Product> {
        Ok(Product {
            id: self.id,
            store: self.store,
            item: self.item,
            measurement: self.measurement,
            product_type: self.product_type,
            category: self.category,
            price_lrd: Money::from_cents(self.price_lrd),
            price_usd: Money::from_cents(self.price_usd),
            pieces: self.pieces,
            cts: self.cts,
            image: self.image,
            created_at: from_millis(self.created_at_ms)?,
        })
    }
}

pub(crate) const PRODUCT_COLUMNS: &str = "id, store, item, measurement, product_type, category, \
     price_lrd, price_usd, pieces, cts, image, created_at_ms";

#[derive(Debug, sqlx::FromRow)]
struct SalesRow {
    product_id: String,
    quantity: i64,
    total_lrd: i64,
    total_usd: i64,
}

/// One page of a product listing.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let created = repo.insert(new_product).await?;
/// let page = repo.list(Some("Main"), PageRequest::default()).await?;
/// let totals = repo.sales_totals(&[created.id.clone()]).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with generated id and `createdAt`
    /// * `Err(DbError::UniqueViolation)` - item already exists in that store
    pub async fn insert(&self, mut new: NewProduct) -> DbResult<Product> {
        validate_new_product(&mut new).map_err(CoreError::from)?;

        let product = Product {
            id: new_id(),
            store: new.store,
            item: new.item,
            measurement: new.measurement,
            product_type: new.product_type,
            category: new.category,
            price_lrd: new.price_lrd,
            price_usd: new.price_usd,
            pieces: new.pieces,
            cts: new.cts,
            image: new.image,
            created_at: Utc::now(),
        };

        debug!(store = %product.store, item = %product.item, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, store, item, measurement, product_type, category,
                price_lrd, price_usd, pieces, cts, image, created_at_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&product.id)
        .bind(&product.store)
        .bind(&product.item)
        .bind(&product.measurement)
        .bind(&product.product_type)
        .bind(product.category)
        .bind(product.price_lrd.cents())
        .bind(product.price_usd.cents())
        .bind(product.pieces)
        .bind(product.cts)
        .bind(&product.image)
        .bind(to_millis(product.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_item(e.into(), &product))?;

        info!(id = %product.id, store = %product.store, "Product created");
        Ok(product)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ProductRow::into_product).transpose()
    }

    /// Gets a product by ID, failing with `ProductNotFound`.
    pub async fn get(&self, id: &str) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
    }

    /// Lists products, newest first, optionally for one store.
    pub async fn list(&self, store: Option<&str>, page: PageRequest) -> DbResult<ProductPage> {
        let store = store.map(str::trim).filter(|s| !s.is_empty());
        debug!(store = ?store, page = page.page, limit = page.limit, "Listing products");

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE ?1 IS NULL OR store = ?1")
            .bind(store)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE ?1 IS NULL OR store = ?1 \
             ORDER BY created_at_ms DESC, id DESC \
             LIMIT ?2 OFFSET ?3"
        ))
        .bind(store)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let products = rows
            .into_iter()
            .map(ProductRow::into_product)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(ProductPage {
            products,
            pagination: Pagination::new(page, total),
        })
    }

    /// Applies a partial update.
    ///
    /// The id and `createdAt` never change. Renaming onto an existing item of
    /// the same store is a `UniqueViolation`.
    pub async fn update(&self, id: &str, patch: ProductPatch) -> DbResult<Product> {
        validate_product_patch(&patch).map_err(CoreError::from)?;

        let mut product = self.get(id).await?;
        patch.apply_to(&mut product);

        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                store = ?2,
                item = ?3,
                measurement = ?4,
                product_type = ?5,
                category = ?6,
                price_lrd = ?7,
                price_usd = ?8,
                pieces = ?9,
                cts = ?10,
                image = ?11
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.store)
        .bind(&product.item)
        .bind(&product.measurement)
        .bind(&product.product_type)
        .bind(product.category)
        .bind(product.price_lrd.cents())
        .bind(product.price_usd.cents())
        .bind(product.pieces)
        .bind(product.cts)
        .bind(&product.image)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_item(e.into(), &product))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }

        Ok(product)
    }

    /// Deletes a product. Past transactions keep their line snapshots.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }

        info!(id = %id, "Product deleted");
        Ok(())
    }

    /// Lifetime sale totals per product id.
    ///
    /// Each line is valued at its snapshot price in its transaction's
    /// currency. Products without sales get zero totals.
    pub async fn sales_totals(&self, ids: &[String]) -> DbResult<HashMap<String, ProductSalesTotals>> {
        let mut totals: HashMap<String, ProductSalesTotals> =
            ids.iter().map(|id| (id.clone(), ProductSalesTotals::default())).collect();
        if ids.is_empty() {
            return Ok(totals);
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT
                l.product_id AS product_id,
                COALESCE(SUM(l.quantity), 0) AS quantity,
                COALESCE(SUM(CASE WHEN t.currency = 'LRD' THEN l.quantity * l.price_lrd ELSE 0 END), 0) AS total_lrd,
                COALESCE(SUM(CASE WHEN t.currency = 'USD' THEN l.quantity * l.price_usd ELSE 0 END), 0) AS total_usd
            FROM transaction_lines l
            INNER JOIN transactions t ON t.id = l.transaction_id
            WHERE t.kind = 'sale' AND l.product_id IN (
            "#,
        );
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(") GROUP BY l.product_id");

        let rows = query.build_query_as::<SalesRow>().fetch_all(&self.pool).await?;

        for row in rows {
            totals.insert(
                row.product_id,
                ProductSalesTotals {
                    total_lrd: Money::from_cents(row.total_lrd),
                    total_usd: Money::from_cents(row.total_usd),
                    total_quantity_sold: row.quantity,
                },
            );
        }

        Ok(totals)
    }

    /// Current names of the given product ids. Unknown ids are absent.
    pub async fn names(&self, ids: &[String]) -> DbResult<HashMap<String, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT id, item FROM products WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let rows: Vec<(String, String)> = query.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().collect())
    }

    /// Counts products (for diagnostics and the seed tool).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Looks up a product by `(id, store)` on any executor, including an open
/// transaction.
pub(crate) async fn fetch_in_store<'e, E>(executor: E, id: &str, store: &str) -> DbResult<Option<Product>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND store = ?2"
    ))
    .bind(id)
    .bind(store)
    .fetch_optional(executor)
    .await?;

    row.map(ProductRow::into_product).transpose()
}

fn duplicate_item(err: DbError, product: &Product) -> DbError {
    if err.is_unique_violation() {
        DbError::duplicate("item", format!("{} in store {}", product.item, product.store))
    } else {
        err
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn new_product(store: &str, item: &str, pieces: i64) -> NewProduct {
        NewProduct {
            store: store.to_string(),
            item: item.to_string(),
            measurement: Some("bag".to_string()),
            product_type: None,
            category: Some(Category::A),
            price_lrd: Money::from_cents(100),
            price_usd: Money::from_cents(1),
            pieces,
            cts: None,
            image: None,
        }
    }

    async fn repo() -> ProductRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().products()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = repo().await;
        let created = repo.insert(new_product(" A ", " Widget ", 10)).await.unwrap();
        assert_eq!(created.store, "A");
        assert_eq!(created.item, "Widget");

        let loaded = repo.get(&created.id).await.unwrap();
        assert_eq!(loaded.category, Some(Category::A));
        assert_eq!(loaded.price_lrd.cents(), 100);
        assert_eq!(loaded.created_at.timestamp_millis(), created.created_at.timestamp_millis());
    }

    #[tokio::test]
    async fn test_duplicate_item_per_store_is_rejected() {
        let repo = repo().await;
        repo.insert(new_product("A", "Widget", 1)).await.unwrap();

        let err = repo.insert(new_product("A", "Widget", 1)).await.unwrap_err();
        assert!(err.is_unique_violation());

        // Same name in another store is fine
        repo.insert(new_product("B", "Widget", 1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_paginates_newest_first() {
        let repo = repo().await;
        for i in 0..5 {
            repo.insert(new_product("A", &format!("Item {i}"), 1)).await.unwrap();
        }
        repo.insert(new_product("B", "Other", 1)).await.unwrap();

        let page = repo.list(Some("A"), PageRequest::new(Some(1), Some(2))).await.unwrap();
        assert_eq!(page.products.len(), 2);
        assert_eq!(page.pagination.total_items, 5);
        assert_eq!(page.pagination.total_pages, 3);
        assert!(page.pagination.has_next_page);

        let all = repo.list(None, PageRequest::default()).await.unwrap();
        assert_eq!(all.pagination.total_items, 6);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = repo().await;
        let created = repo.insert(new_product("A", "Widget", 10)).await.unwrap();

        let patch = ProductPatch {
            price_usd: Some(Money::from_cents(2)),
            ..Default::default()
        };
        let updated = repo.update(&created.id, patch).await.unwrap();
        assert_eq!(updated.price_usd.cents(), 2);
        assert_eq!(updated.pieces, 10);

        repo.delete(&created.id).await.unwrap();
        assert!(matches!(
            repo.get(&created.id).await,
            Err(DbError::Domain(CoreError::ProductNotFound(_)))
        ));
        assert!(repo.delete(&created.id).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_product_is_rejected() {
        let repo = repo().await;
        let mut bad = new_product("A", "Widget", 1);
        bad.price_usd = Money::from_cents(-1);
        assert!(matches!(
            repo.insert(bad).await,
            Err(DbError::Domain(CoreError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_sales_totals_default_to_zero() {
        let repo = repo().await;
        let created = repo.insert(new_product("A", "Widget", 10)).await.unwrap();
        let totals = repo.sales_totals(&[created.id.clone()]).await.unwrap();
        assert_eq!(totals[&created.id], ProductSalesTotals::default());

        let names = repo.names(&[created.id.clone(), "missing".to_string()]).await.unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names[&created.id], "Widget");
    }
}
