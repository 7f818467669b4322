//! Ledger endpoints: posting, lookups and sales reports.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use stockroom_core::period::{DateWindow, WindowSpec};
use stockroom_core::posting::{LineRequest, PostRequest};
use stockroom_core::report::{ReportScope, SalesReport, TopProduct};
use stockroom_core::validation::{parse_day, parse_timestamp};
use stockroom_core::{Currency, Transaction, TransactionType, ValidationError};
use stockroom_db::{ProductHistory, RangeReport};

use crate::error::{ApiError, ApiResult};
use crate::extract::{AppJson, AppQuery};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions).post(create_transaction))
        .route("/range", get(transactions_by_range))
        .route("/report", get(sales_report))
        .route("/top-products", get(top_products))
        .route("/product/{product_id}", get(transactions_by_product))
        .route("/date/{date}", get(transactions_by_date))
        .route("/{id}", get(get_transaction))
}

// =============================================================================
// Request shapes
// =============================================================================

/// One line of a posting request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineBody {
    pub product: String,
    pub quantity: i64,
}

/// Body of `POST /transactions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionBody {
    pub products_sold: Vec<LineBody>,
    pub currency: Currency,
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub date: Option<String>,
}

impl CreateTransactionBody {
    fn into_request(self, default_store: Option<&str>) -> ApiResult<PostRequest> {
        let store = self
            .store
            .filter(|s| !s.trim().is_empty())
            .or_else(|| default_store.map(str::to_string))
            .ok_or_else(|| ValidationError::Required {
                field: "store".to_string(),
            })?;

        let date = self
            .date
            .as_deref()
            .map(|d| parse_timestamp("date", d))
            .transpose()?;

        Ok(PostRequest {
            store,
            kind: self.kind,
            currency: self.currency,
            date,
            lines: self
                .products_sold
                .into_iter()
                .map(|line| LineRequest {
                    product_id: line.product,
                    quantity: line.quantity,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreQuery {
    pub store: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub store: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub period: Option<String>,
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub store: Option<String>,
    #[serde(default)]
    pub all_stores: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<Transaction>,
}

// =============================================================================
// Handlers
// =============================================================================

async fn create_transaction(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateTransactionBody>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let request = body.into_request(state.default_store())?;
    let transaction = state.db.transactions().post(request).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

async fn list_transactions(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<StoreQuery>,
) -> ApiResult<Json<Vec<Transaction>>> {
    let store = state.store_filter(query.store.as_deref());
    Ok(Json(state.db.transactions().list(store).await?))
}

async fn get_transaction(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Transaction>> {
    Ok(Json(state.db.transactions().get(&id).await?))
}

async fn transactions_by_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
    AppQuery(query): AppQuery<StoreQuery>,
) -> ApiResult<Json<TransactionsResponse>> {
    let day = parse_day("date", &date)?;
    let store = state.store_filter(query.store.as_deref());
    let transactions = state.db.transactions().by_date(day, store).await?;
    Ok(Json(TransactionsResponse { transactions }))
}

async fn transactions_by_range(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<RangeQuery>,
) -> ApiResult<Json<RangeReport>> {
    let first = parse_day("startDate", required("startDate", query.start_date.as_deref())?)?;
    let last = parse_day("endDate", required("endDate", query.end_date.as_deref())?)?;
    let store = state.store_filter(query.store.as_deref());

    let report = state.db.reports().transactions_by_date_range(first, last, store).await?;
    Ok(Json(report))
}

async fn sales_report(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ReportQuery>,
) -> ApiResult<Json<SalesReport>> {
    let spec = WindowSpec::from_params(
        query.period.as_deref(),
        query.date.as_deref(),
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        state.today(),
    )?;
    let scope = ReportScope::resolve(query.store.as_deref(), query.all_stores, state.default_store())?;

    Ok(Json(state.db.reports().sales_report(spec, scope).await?))
}

async fn top_products(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<RangeQuery>,
) -> ApiResult<Json<Vec<TopProduct>>> {
    let first = query.start_date.as_deref().map(|d| parse_day("startDate", d)).transpose()?;
    let last = query.end_date.as_deref().map(|d| parse_day("endDate", d)).transpose()?;
    let window = DateWindow::open(first, last, state.today())?;
    let store = state.store_filter(query.store.as_deref());

    Ok(Json(state.db.reports().top_products(window, store).await?))
}

async fn transactions_by_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    AppQuery(query): AppQuery<StoreQuery>,
) -> ApiResult<Json<ProductHistory>> {
    let store = state.store_filter(query.store.as_deref());
    Ok(Json(state.db.reports().transactions_by_product(&product_id, store).await?))
}

fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, ApiError> {
    value.filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        ValidationError::Required {
            field: field.to_string(),
        }
        .into()
    })
}
