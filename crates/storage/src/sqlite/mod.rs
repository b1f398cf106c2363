use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

use crate::repository::{Storage, StudentPropertyRepository};

mod mapping;
mod migrate;
mod property_repo;

pub use migrate::SCHEMA_VERSION;

/// Student properties persisted in a `SQLite` database.
#[derive(Clone)]
pub struct SqlitePropertyStore {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("database schema version {found} is newer than supported version {supported}")]
    NewerSchema { found: i64, supported: i64 },
}

impl SqlitePropertyStore {
    /// Open (creating if missing) the database at `database_url`.
    ///
    /// Connections run in WAL mode with a busy timeout so concurrent writers
    /// for different students wait instead of failing.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the URL is invalid or the connection
    /// cannot be established.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool, e.g. one shared with other tables.
    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Bring the schema up to `SCHEMA_VERSION`.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError::NewerSchema` if the database was migrated by
    /// a newer build, or `SqliteInitError::Sqlx` if a migration fails.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Build a `Storage` backed by `SQLite`, migrating on open.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let store = SqlitePropertyStore::connect(database_url).await?;
        store.migrate().await?;
        let properties: Arc<dyn StudentPropertyRepository> = Arc::new(store);
        Ok(Self { properties })
    }
}
