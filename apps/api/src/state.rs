//! Shared application state.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use stockroom_db::{Database, DbResult};

use crate::config::ApiConfig;

/// State handed to every handler. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }

    /// Opens the configured database (running migrations) and wraps it.
    pub async fn connect(config: ApiConfig) -> DbResult<Self> {
        let db = Database::new(config.db_config()).await?;
        Ok(AppState::new(db, config))
    }

    pub fn default_store(&self) -> Option<&str> {
        self.config.default_store.as_deref()
    }

    /// The store a read should be limited to: the requested one, else the
    /// configured default, else none (all stores).
    pub fn store_filter<'a>(&'a self, requested: Option<&'a str>) -> Option<&'a str> {
        requested
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| self.default_store())
    }

    /// Today's calendar date (UTC), the anchor for open-ended report windows.
    pub fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}
