//! Registry error types.

use thiserror::Error;

/// Company registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Failed to open the database.
    #[error("failed to open database: {0}")]
    Open(String),

    /// Table name is not a plain SQL identifier.
    #[error("invalid table name: {0}")]
    InvalidTable(String),

    /// Underlying `SQLx` error.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

impl From<RegistryError> for esg_core::EsgError {
    fn from(err: RegistryError) -> Self {
        Self::Registry(err.to_string())
    }
}
