//! # Stockroom API
//!
//! HTTP server for the Stockroom inventory and sales ledger.
//!
//! ## Endpoints
//! ```text
//! GET    /health
//!
//! POST   /api/products                      GET /api/products?store&page&limit
//! GET    /api/products/{id}                 PUT /api/products/{id}
//! DELETE /api/products/{id}
//!
//! POST   /api/transactions                  GET /api/transactions?store
//! GET    /api/transactions/{id}
//! GET    /api/transactions/date/{date}?store
//! GET    /api/transactions/range?startDate&endDate&store
//! GET    /api/transactions/report?period&date|startDate&endDate&store|allStores
//! GET    /api/transactions/top-products?startDate&endDate&store
//! GET    /api/transactions/product/{productId}?store
//!
//! POST   /api/users/register                POST /api/users/login
//! GET    /api/users/stores                  GET  /api/users/stores/{store}/users
//! GET    /api/users/users?username
//! PUT    /api/users/users/{userId}/type     PUT  /api/users/users/{userId}/password
//! DELETE /api/users/users/{userId}?username
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]. CORS origins come from `STOCKROOM_CORS_ORIGINS`
//! (comma-separated, or `*`; localhost only when unset).

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Request bodies are small JSON documents.
const MAX_BODY_BYTES: usize = 1024 * 1024;

// =============================================================================
// HEALTH
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// `ok` when the database answers, `degraded` otherwise.
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.db.health_check().await { "ok" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins (STOCKROOM_CORS_ORIGINS=*)");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => Some(hv),
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!("CORS: No valid origins in STOCKROOM_CORS_ORIGINS, defaulting to localhost only");
                build_localhost_cors()
            } else {
                tracing::info!(count = allowed.len(), "CORS: Allowing configured origins");
                with_methods(CorsLayer::new().allow_origin(allowed))
            }
        }
        None => build_localhost_cors(),
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5173",
    ]
    .iter()
    .filter_map(|o| o.parse().ok())
    .collect();

    with_methods(CorsLayer::new().allow_origin(origins))
}

fn with_methods(layer: CorsLayer) -> CorsLayer {
    layer
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner): tracing, CORS, body limit.
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(state.config.cors_origins.as_deref());

    let api = Router::new()
        .nest("/products", routes::products::router())
        .nest("/transactions", routes::transactions::router())
        .nest("/users", routes::users::router());

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}
