//! # Database Migrations
//!
//! The schema lives in `migrations/sqlite/` at the workspace root and is
//! compiled into the binary by `sqlx::migrate!`.
//!
//! ```text
//! migrations/sqlite/
//! └── 0001_initial_schema.sql   products, transactions, transaction_lines, users
//! ```
//!
//! New changes go in a new numbered file; applied files are never edited
//! (sqlx records a checksum per file in `_sqlx_migrations` and refuses to
//! start if one changes). Timestamps are INTEGER unix milliseconds and money
//! is INTEGER minor units throughout.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every embedded migration not yet recorded in the database.
///
/// Safe to call on every start: already-applied files are skipped.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let status = migration_status(pool).await.unwrap_or(MigrationStatus {
        embedded: MIGRATOR.migrations.len(),
        applied: 0,
    });

    if status.is_current() {
        debug!(applied = status.applied, "No pending migrations");
    } else {
        info!(
            embedded = status.embedded,
            applied = status.applied,
            "Applying schema migrations"
        );
    }

    MIGRATOR.run(pool).await?;

    info!("Schema up to date");
    Ok(())
}

/// Embedded vs. applied migration counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationStatus {
    pub embedded: usize,
    pub applied: usize,
}

impl MigrationStatus {
    pub fn is_current(&self) -> bool {
        self.applied >= self.embedded
    }
}

/// Reads how many embedded migrations have been applied successfully.
///
/// Fails if the bookkeeping table does not exist yet (fresh database).
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await?;

    Ok(MigrationStatus {
        embedded: MIGRATOR.migrations.len(),
        applied: usize::try_from(applied).unwrap_or_default(),
    })
}
