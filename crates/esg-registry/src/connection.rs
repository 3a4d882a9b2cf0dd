//! Database connection management.
//!
//! Wraps an `SQLx` `SQLite` pool opened read-only against the company database.
//! Only `:memory:` databases are writable, so tests can seed them.

use crate::error::{RegistryError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;

/// Connection pool for the company database.
#[derive(Debug, Clone)]
pub struct RegistryPool {
    pool: Pool<Sqlite>,
}

impl RegistryPool {
    /// Open a connection pool.
    ///
    /// # Arguments
    /// * `path` - Path to the `SQLite` database file (or `:memory:` for in-memory)
    ///
    /// # Errors
    /// Returns `RegistryError::Open` if the path is not UTF-8 or the database
    /// cannot be opened.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path.as_ref().to_str().ok_or_else(|| {
            RegistryError::Open("invalid database path: not valid UTF-8".to_string())
        })?;

        let in_memory = path_str == ":memory:";
        let connect_options = SqliteConnectOptions::from_str(path_str)
            .map_err(|e| RegistryError::Open(format!("invalid connection string: {e}")))?
            .create_if_missing(in_memory)
            .read_only(!in_memory);

        // In-memory databases are per-connection, so pin the pool to one
        let max_connections = if in_memory { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await
            .map_err(|e| RegistryError::Open(format!("failed to open {path_str}: {e}")))?;

        tracing::info!("Registry database pool created at {}", path_str);

        Ok(Self { pool })
    }

    /// Get a reference to the underlying `SQLx` pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the connection pool gracefully.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("Registry database pool closed");
    }
}
