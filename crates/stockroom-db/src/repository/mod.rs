//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  state.db.transactions().post(request)                         │
//! │       ▼                                                                 │
//! │  ┌────────────────────┐  ┌──────────────────────┐                      │
//! │  │ ProductRepository  │  │ TransactionRepository│                      │
//! │  │ catalog CRUD       │  │ posting engine +     │                      │
//! │  │ sales totals       │  │ ledger reads         │                      │
//! │  └────────────────────┘  └──────────────────────┘                      │
//! │  ┌────────────────────┐  ┌──────────────────────┐                      │
//! │  │ ReportRepository   │  │ UserRepository       │                      │
//! │  │ window fetch +     │  │ register / login /   │                      │
//! │  │ core report folds  │  │ role management      │                      │
//! │  └────────────────────┘  └──────────────────────┘                      │
//! │       │                                                                 │
//! │       │  SQL (runtime-checked sqlx queries)                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are read into private `*Row` structs (`sqlx::FromRow`) and converted
//! into `stockroom_core` types at the repository boundary.

pub mod product;
pub mod report;
pub mod transaction;
pub mod user;

use chrono::{DateTime, Utc};

use crate::error::{DbError, DbResult};

/// Converts a domain timestamp to the stored unix-millisecond form.
pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// Converts stored unix milliseconds back to a timestamp.
pub(crate) fn from_millis(ms: i64) -> DbResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| DbError::Internal(format!("timestamp out of range: {ms}")))
}
