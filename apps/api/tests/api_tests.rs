//! Integration tests for the Stockroom HTTP API.
//!
//! Uses axum-test against a router backed by an in-memory SQLite database.

#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use stockroom_api::{create_router, ApiConfig, AppState, HealthResponse};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn memory_config() -> ApiConfig {
    ApiConfig {
        database_path: ":memory:".to_string(),
        ..ApiConfig::default()
    }
}

async fn create_test_server_with(config: ApiConfig) -> TestServer {
    let state = AppState::connect(config).await.unwrap();
    TestServer::new(create_router(state)).unwrap()
}

async fn create_test_server() -> TestServer {
    create_test_server_with(memory_config()).await
}

/// Creates a product and returns its id.
async fn create_product(server: &TestServer, store: &str, item: &str, pieces: i64) -> String {
    let response = server
        .post("/api/products")
        .json(&json!({
            "store": store,
            "item": item,
            "priceLRD": 45000,
            "priceUSD": 250,
            "pieces": pieces,
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let product: Value = response.json();
    product["id"].as_str().unwrap().to_string()
}

async fn pieces_of(server: &TestServer, id: &str) -> i64 {
    let product: Value = server.get(&format!("/api/products/{id}")).await.json();
    product["pieces"].as_i64().unwrap()
}

async fn post_sale(server: &TestServer, store: &str, lines: Value, currency: &str) -> axum_test::TestResponse {
    server
        .post("/api/transactions")
        .json(&json!({
            "store": store,
            "currency": currency,
            "productsSold": lines,
        }))
        .await
}

// =============================================================================
// HEALTH
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server().await;

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// PRODUCTS
// =============================================================================

#[tokio::test]
async fn test_product_crud_and_listing() {
    let server = create_test_server().await;
    let id = create_product(&server, "Main", "Rice 25kg", 10).await;
    create_product(&server, "Main", "Sugar 1kg", 4).await;
    create_product(&server, "Harbel", "Rice 25kg", 2).await;

    let listing: Value = server
        .get("/api/products")
        .add_query_param("store", "Main")
        .add_query_param("limit", 1)
        .await
        .json();
    assert_eq!(listing["products"].as_array().unwrap().len(), 1);
    assert_eq!(listing["pagination"]["totalItems"], 2);
    assert_eq!(listing["pagination"]["totalPages"], 2);
    assert_eq!(listing["pagination"]["hasNextPage"], true);
    assert_eq!(listing["products"][0]["totalQuantitySold"], 0);

    let updated: Value = server
        .put(&format!("/api/products/{id}"))
        .json(&json!({ "priceUSD": 300 }))
        .await
        .json();
    assert_eq!(updated["priceUSD"], 300);
    assert_eq!(updated["item"], "Rice 25kg");

    server.delete(&format!("/api/products/{id}")).await.assert_status_ok();
    server
        .get(&format!("/api/products/{id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_item_in_store_is_rejected() {
    let server = create_test_server().await;
    create_product(&server, "Main", "Widget", 1).await;

    let response = server
        .post("/api/products")
        .json(&json!({ "store": "Main", "item": "Widget" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_oversized_price_is_rejected() {
    let server = create_test_server().await;

    let response = server
        .post("/api/products")
        .json(&json!({
            "store": "Main",
            "item": "Gold Bar",
            "priceUSD": i64::MAX / 2,
            "pieces": 10,
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("priceUSD"));
}

#[tokio::test]
async fn test_malformed_json_is_a_bad_request() {
    let server = create_test_server().await;

    let response = server
        .post("/api/transactions")
        .json(&json!({ "currency": "EUR", "productsSold": [] }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].is_string());
}

// =============================================================================
// POSTING
// =============================================================================

#[tokio::test]
async fn test_widget_sale_and_insufficient_stock() {
    let server = create_test_server().await;
    let widget = create_product(&server, "S1", "Widget", 10).await;

    let response = post_sale(&server, "S1", json!([{ "product": widget, "quantity": 3 }]), "USD").await;
    response.assert_status(StatusCode::CREATED);
    let tx: Value = response.json();
    assert_eq!(tx["type"], "sale");
    assert_eq!(tx["currency"], "USD");
    assert_eq!(tx["totalUSD"], 750);
    assert_eq!(tx["totalLRD"], 0);
    assert_eq!(tx["productsSold"][0]["productName"], "Widget");
    assert_eq!(tx["productsSold"][0]["priceAtSale"]["LRD"], 45000);
    assert_eq!(pieces_of(&server, &widget).await, 7);

    let response = post_sale(&server, "S1", json!([{ "product": widget, "quantity": 8 }]), "USD").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("Widget"));
    assert_eq!(pieces_of(&server, &widget).await, 7);

    let fetched: Value = server
        .get(&format!("/api/transactions/{}", tx["id"].as_str().unwrap()))
        .await
        .json();
    assert_eq!(fetched, tx);
}

#[tokio::test]
async fn test_failed_line_rolls_back_earlier_lines() {
    let server = create_test_server().await;
    let rice = create_product(&server, "Main", "Rice", 10).await;
    let oil = create_product(&server, "Main", "Oil", 1).await;

    let response = post_sale(
        &server,
        "Main",
        json!([
            { "product": rice, "quantity": 4 },
            { "product": oil, "quantity": 2 },
        ]),
        "LRD",
    )
    .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(pieces_of(&server, &rice).await, 10);
    assert_eq!(pieces_of(&server, &oil).await, 1);
}

#[tokio::test]
async fn test_product_from_another_store_is_not_found() {
    let server = create_test_server().await;
    let harbel_rice = create_product(&server, "Harbel", "Rice", 10).await;

    let response = post_sale(&server, "Main", json!([{ "product": harbel_rice, "quantity": 1 }]), "LRD").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(pieces_of(&server, &harbel_rice).await, 10);
}

#[tokio::test]
async fn test_restock_increments_stock() {
    let server = create_test_server().await;
    let rice = create_product(&server, "Main", "Rice", 0).await;

    let response = server
        .post("/api/transactions")
        .json(&json!({
            "store": "Main",
            "type": "restock",
            "currency": "USD",
            "productsSold": [{ "product": rice, "quantity": 25 }],
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    assert_eq!(pieces_of(&server, &rice).await, 25);
}

#[tokio::test]
async fn test_missing_store_without_default_is_rejected() {
    let server = create_test_server().await;

    let response = server
        .post("/api/transactions")
        .json(&json!({ "currency": "LRD", "productsSold": [{ "product": "x", "quantity": 1 }] }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

// =============================================================================
// REPORTS
// =============================================================================

#[tokio::test]
async fn test_weekly_report_window_and_totals() {
    let server = create_test_server().await;
    let rice = create_product(&server, "Main", "Rice", 100).await;

    for (date, currency, qty) in [
        ("2024-03-06T10:00:00Z", "LRD", 2),
        ("2024-03-06T15:00:00Z", "LRD", 1),
        ("2024-03-08T09:00:00Z", "USD", 4),
        ("2024-03-10T09:00:00Z", "USD", 5),
    ] {
        server
            .post("/api/transactions")
            .json(&json!({
                "store": "Main",
                "currency": currency,
                "date": date,
                "productsSold": [{ "product": rice, "quantity": qty }],
            }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let report: Value = server
        .get("/api/transactions/report")
        .add_query_param("period", "weekly")
        .add_query_param("date", "2024-03-06")
        .add_query_param("store", "Main")
        .await
        .json();

    assert!(report["startDate"].as_str().unwrap().starts_with("2024-03-03T00:00:00"));
    assert!(report["endDate"].as_str().unwrap().starts_with("2024-03-09T23:59:59.999"));
    assert_eq!(report["transactions"].as_array().unwrap().len(), 3);
    assert_eq!(report["overallTotals"]["totalLRD"], 3 * 45000);
    assert_eq!(report["overallTotals"]["totalUSD"], 4 * 250);
    assert_eq!(report["overallTotals"]["totalItems"], 7);

    let daily = report["dailyTotals"].as_array().unwrap();
    assert_eq!(daily[0]["date"], "2024-03-08");
    assert_eq!(daily[1]["date"], "2024-03-06");
    assert_eq!(daily[1]["transactions"], 2);
    assert_eq!(daily[1]["totalUSD"], 0);
    assert!(report.get("storeTotals").is_none());

    let again: Value = server
        .get("/api/transactions/report")
        .add_query_param("period", "weekly")
        .add_query_param("date", "2024-03-06")
        .add_query_param("store", "Main")
        .await
        .json();
    assert_eq!(report, again);
}

#[tokio::test]
async fn test_report_argument_errors() {
    let server = create_test_server().await;

    server
        .get("/api/transactions/report")
        .add_query_param("period", "daily")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .get("/api/transactions/report")
        .add_query_param("period", "fortnightly")
        .add_query_param("store", "Main")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid period specified");

    server
        .get("/api/transactions/report")
        .add_query_param("startDate", "2024-03-10")
        .add_query_param("endDate", "2024-03-01")
        .add_query_param("allStores", true)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_all_stores_report_and_default_store() {
    let config = ApiConfig {
        default_store: Some("Main".to_string()),
        ..memory_config()
    };
    let server = create_test_server_with(config).await;
    let main_rice = create_product(&server, "Main", "Rice", 10).await;
    let harbel_rice = create_product(&server, "Harbel", "Rice", 10).await;

    post_sale(&server, "Main", json!([{ "product": main_rice, "quantity": 1 }]), "LRD")
        .await
        .assert_status(StatusCode::CREATED);
    post_sale(&server, "Harbel", json!([{ "product": harbel_rice, "quantity": 2 }]), "LRD")
        .await
        .assert_status(StatusCode::CREATED);

    let all: Value = server
        .get("/api/transactions/report")
        .add_query_param("period", "daily")
        .add_query_param("allStores", true)
        .await
        .json();
    let stores = all["storeTotals"].as_array().unwrap();
    assert_eq!(stores.len(), 2);
    assert_eq!(stores[0]["store"], "Harbel");
    assert_eq!(all["productTotals"].as_array().unwrap().len(), 2);

    let defaulted: Value = server
        .get("/api/transactions/report")
        .add_query_param("period", "daily")
        .await
        .json();
    assert_eq!(defaulted["store"], "Main");
    assert_eq!(defaulted["overallTotals"]["totalItems"], 1);
}

#[tokio::test]
async fn test_top_products_range_and_product_history() {
    let server = create_test_server().await;
    let rice = create_product(&server, "Main", "Rice", 100).await;
    let oil = create_product(&server, "Main", "Oil", 100).await;

    post_sale(
        &server,
        "Main",
        json!([{ "product": rice, "quantity": 5 }, { "product": oil, "quantity": 1 }]),
        "USD",
    )
    .await
    .assert_status(StatusCode::CREATED);
    post_sale(&server, "Main", json!([{ "product": oil, "quantity": 2 }]), "LRD")
        .await
        .assert_status(StatusCode::CREATED);

    let top: Value = server.get("/api/transactions/top-products").await.json();
    let top = top.as_array().unwrap();
    assert_eq!(top[0]["item"], "Rice");
    assert_eq!(top[0]["totalQuantity"], 5);
    assert_eq!(top[1]["item"], "Oil");
    assert_eq!(top[1]["transactions"], 2);
    assert_eq!(top[1]["totalSalesUSD"], 250);
    assert_eq!(top[1]["totalSalesLRD"], 2 * 45000);

    let history: Value = server.get(&format!("/api/transactions/product/{oil}")).await.json();
    assert_eq!(history["transactions"].as_array().unwrap().len(), 2);
    assert_eq!(history["totals"]["totalQuantity"], 3);
    assert_eq!(history["totals"]["totalUSD"], 250);

    let today = chrono::Utc::now().date_naive().to_string();
    let range: Value = server
        .get("/api/transactions/range")
        .add_query_param("startDate", &today)
        .add_query_param("endDate", &today)
        .await
        .json();
    assert_eq!(range["totals"]["totalTransactions"], 2);
    assert_eq!(range["totals"]["totalItems"], 8);
    assert_eq!(range["dailyTotals"].as_array().unwrap().len(), 1);

    let by_date: Value = server.get(&format!("/api/transactions/date/{today}")).await.json();
    assert_eq!(by_date["transactions"].as_array().unwrap().len(), 2);

    server
        .get("/api/transactions/range")
        .add_query_param("startDate", &today)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

// =============================================================================
// USERS
// =============================================================================

#[tokio::test]
async fn test_user_directory_flow() {
    let server = create_test_server().await;

    let response = server
        .post("/api/users/register")
        .json(&json!({ "username": "boss", "password": "secret1", "userType": "admin", "store": "Main" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let boss: Value = response.json();
    assert_eq!(boss["userType"], "admin");
    assert!(boss.get("passwordHash").is_none());

    let clerk: Value = server
        .post("/api/users/register")
        .json(&json!({ "username": "clerk", "password": "secret1", "store": "Harbel" }))
        .await
        .json();
    assert_eq!(clerk["userType"], "employee");
    let clerk_id = clerk["id"].as_str().unwrap();

    server
        .post("/api/users/register")
        .json(&json!({ "username": "clerk", "password": "secret1", "store": "Main" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .post("/api/users/login")
        .json(&json!({ "username": "clerk", "password": "wrong-one" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .post("/api/users/login")
        .json(&json!({ "username": "clerk", "password": "secret1" }))
        .await
        .assert_status_ok();

    server
        .get("/api/users/users")
        .add_query_param("username", "clerk")
        .await
        .assert_status(StatusCode::FORBIDDEN);
    let users: Value = server
        .get("/api/users/users")
        .add_query_param("username", "boss")
        .await
        .json();
    assert_eq!(users.as_array().unwrap().len(), 2);

    let stores: Value = server.get("/api/users/stores").await.json();
    assert_eq!(stores, json!(["Harbel", "Main"]));
    let harbel: Value = server.get("/api/users/stores/Harbel/users").await.json();
    assert_eq!(harbel[0]["username"], "clerk");

    server
        .put(&format!("/api/users/users/{clerk_id}/type"))
        .json(&json!({ "userType": "owner", "username": "boss" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    let promoted: Value = server
        .put(&format!("/api/users/users/{clerk_id}/type"))
        .json(&json!({ "userType": "admin", "username": "boss" }))
        .await
        .json();
    assert_eq!(promoted["userType"], "admin");

    server
        .put(&format!("/api/users/users/{clerk_id}/password"))
        .json(&json!({ "currentPassword": "secret1", "newPassword": "secret2" }))
        .await
        .assert_status_ok();

    server
        .delete(&format!("/api/users/users/{clerk_id}"))
        .add_query_param("username", "boss")
        .await
        .assert_status_ok();
    server
        .delete(&format!("/api/users/users/{clerk_id}"))
        .add_query_param("username", "boss")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
