//! Catalog endpoints.
//!
//! Listings and detail views carry each product's lifetime sales
//! (`totalLRD`, `totalUSD`, `totalQuantitySold`) next to its fields.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use stockroom_core::report::ProductSalesTotals;
use stockroom_core::{NewProduct, PageRequest, Pagination, Product, ProductPatch};
use tracing::info;

use crate::error::ApiResult;
use crate::extract::{AppJson, AppQuery};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/{id}", get(get_product).put(update_product).delete(delete_product))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub store: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// A product with its sales totals flattened in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductWithTotals {
    #[serde(flatten)]
    pub product: Product,
    #[serde(flatten)]
    pub totals: ProductSalesTotals,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductWithTotals>,
    pub pagination: Pagination,
}

async fn create_product(
    State(state): State<AppState>,
    AppJson(mut new): AppJson<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    if new.store.trim().is_empty() {
        if let Some(store) = state.default_store() {
            new.store = store.to_string();
        }
    }

    let product = state.db.products().insert(new).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn list_products(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<Json<ProductListResponse>> {
    let store = state.store_filter(query.store.as_deref());
    let page = state
        .db
        .products()
        .list(store, PageRequest::new(query.page, query.limit))
        .await?;

    let ids: Vec<String> = page.products.iter().map(|p| p.id.clone()).collect();
    let totals = state.db.products().sales_totals(&ids).await?;

    let products = page
        .products
        .into_iter()
        .map(|product| {
            let totals = totals.get(&product.id).copied().unwrap_or_default();
            ProductWithTotals { product, totals }
        })
        .collect();

    Ok(Json(ProductListResponse {
        products,
        pagination: page.pagination,
    }))
}

async fn get_product(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<ProductWithTotals>> {
    let product = state.db.products().get(&id).await?;
    let totals = state
        .db
        .products()
        .sales_totals(std::slice::from_ref(&product.id))
        .await?
        .remove(&product.id)
        .unwrap_or_default();

    Ok(Json(ProductWithTotals { product, totals }))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(patch): AppJson<ProductPatch>,
) -> ApiResult<Json<Product>> {
    let product = state.db.products().update(&id, patch).await?;
    Ok(Json(product))
}

async fn delete_product(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    state.db.products().delete(&id).await?;
    info!(product_id = %id, "Product removed from catalog");
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}
