//! Company registry for the ESG report harvester.
//!
//! The registry is read-only: the harvester only ever lists the companies of
//! a table, in storage order.

pub mod companies;
pub mod connection;
pub mod error;

pub use connection::RegistryPool;
pub use error::{RegistryError, Result};

use esg_core::CompanyName;
use std::path::Path;

/// Source of the company list for a run.
#[async_trait::async_trait]
pub trait CompanyRegistry: Send + Sync {
    /// Ordered company names of `table`
    async fn list_companies(&self, table: &str) -> Result<Vec<CompanyName>>;
}

/// Registry backed by a `SQLite` database.
#[derive(Debug, Clone)]
pub struct SqliteRegistry {
    pool: RegistryPool,
}

impl SqliteRegistry {
    /// Open the registry database at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            pool: RegistryPool::new(path).await?,
        })
    }

    /// Get a reference to the underlying `SQLx` pool.
    #[must_use]
    pub fn pool(&self) -> &sqlx::SqlitePool {
        self.pool.pool()
    }

    /// Close the registry.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait::async_trait]
impl CompanyRegistry for SqliteRegistry {
    async fn list_companies(&self, table: &str) -> Result<Vec<CompanyName>> {
        companies::list_companies(self.pool.pool(), table).await
    }
}

/// Registry over a fixed in-memory list, for ad-hoc runs.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    companies: Vec<CompanyName>,
}

impl StaticRegistry {
    /// Registry returning `companies` for every table.
    #[must_use]
    pub fn new(companies: Vec<CompanyName>) -> Self {
        Self { companies }
    }
}

#[async_trait::async_trait]
impl CompanyRegistry for StaticRegistry {
    async fn list_companies(&self, _table: &str) -> Result<Vec<CompanyName>> {
        Ok(self.companies.clone())
    }
}
