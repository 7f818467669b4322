//! # Database Error Types
//!
//! ```text
//! sqlx::Error ──classified──┐
//!                           ▼
//! CoreError ──────────► DbError ──► ApiError (apps/api) ──► {"error": "..."}
//! ```
//!
//! Business-rule failures found while a repository is working (product not in
//! this store, stock too low, caller not an admin) travel as
//! [`DbError::Domain`] so the HTTP layer can pick a status from the
//! `CoreError` variant. Everything else is a storage failure.

use sqlx::error::ErrorKind;
use stockroom_core::CoreError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// A row the caller asked for by key does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the write: `(store, item)` for products,
    /// `username` for users.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Begin or commit of a posting transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A stored value could not be mapped back to a domain type.
    #[error("Internal database error: {0}")]
    Internal(String),

    #[error(transparent)]
    Domain(#[from] CoreError),
}

impl DbError {
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => match db_err.kind() {
                // SQLite: "UNIQUE constraint failed: products.store, products.item"
                ErrorKind::UniqueViolation => DbError::UniqueViolation {
                    field: db_err
                        .message()
                        .rsplit(": ")
                        .next()
                        .unwrap_or("unknown")
                        .to_string(),
                    value: "unknown".to_string(),
                },
                ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation {
                    message: db_err.message().to_string(),
                },
                _ => DbError::QueryFailed(db_err.message().to_string()),
            },

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => DbError::Internal(err.to_string()),

            _ => DbError::QueryFailed(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_keep_their_message() {
        let err: DbError = CoreError::ProductNotFound("p-1".to_string()).into();
        assert_eq!(err.to_string(), "Product p-1 not found");
        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(_))));
    }

    #[test]
    fn test_sqlx_error_classification() {
        assert!(matches!(DbError::from(sqlx::Error::RowNotFound), DbError::NotFound { .. }));
        assert!(matches!(DbError::from(sqlx::Error::PoolTimedOut), DbError::PoolExhausted));
        assert!(DbError::duplicate("username", "ama").is_unique_violation());
    }
}
