//! HTTP error responses.
//!
//! Every failure leaves the server as `{"error": "<message>"}` with one of
//! four status codes:
//!
//! ```text
//! DbError::Domain(ProductNotFound | TransactionNotFound | UserNotFound) → 404
//! DbError::NotFound                                                     → 404
//! DbError::Domain(Forbidden)                                            → 403
//! DbError::Domain(anything else), UniqueViolation, ForeignKeyViolation  → 400
//! connection / pool / query / migration failures                        → 500
//! ```
//!
//! 500s are logged in full and sent with a generic message.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use stockroom_core::{CoreError, ValidationError};
use stockroom_db::DbError;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::ProductNotFound(_) | CoreError::TransactionNotFound(_) | CoreError::UserNotFound(_) => {
                ApiError::NotFound(error.to_string())
            }
            CoreError::Forbidden(_) => ApiError::Forbidden(error.to_string()),
            CoreError::InsufficientStock { .. }
            | CoreError::InvalidArgument(_)
            | CoreError::InvalidCredentials
            | CoreError::Validation(_) => ApiError::BadRequest(error.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::BadRequest(error.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::Domain(core) => core.into(),
            DbError::NotFound { .. } => ApiError::NotFound(error.to_string()),
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                ApiError::BadRequest(error.to_string())
            }
            DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::TransactionFailed(_)
            | DbError::PoolExhausted
            | DbError::Internal(_) => ApiError::Internal(error.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                "Internal server error".to_string()
            }
            other => {
                tracing::debug!(status = %status, error = %other, "Request rejected");
                other.to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Handler result.
pub type ApiResult<T> = Result<T, ApiError>;
