//! Company list queries.

use crate::error::{RegistryError, Result};
use esg_core::CompanyName;
use regex::Regex;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Check that a table name is a plain identifier before it is spliced into SQL.
///
/// # Errors
/// Returns `RegistryError::InvalidTable` for anything other than
/// `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_table_name(table: &str) -> Result<()> {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    let regex = IDENT.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

    if regex.is_match(table) {
        Ok(())
    } else {
        Err(RegistryError::InvalidTable(table.to_string()))
    }
}

/// List the companies of `table` in storage order.
///
/// Rows with a NULL or blank name are skipped, and repeated names keep only
/// their first occurrence so every name is a unique task key.
///
/// # Errors
/// Returns an error if the table name is invalid or the query fails.
pub async fn list_companies(pool: &SqlitePool, table: &str) -> Result<Vec<CompanyName>> {
    validate_table_name(table)?;

    let rows: Vec<Option<String>> =
        sqlx::query_scalar(&format!("SELECT company_name FROM {table} ORDER BY rowid"))
            .fetch_all(pool)
            .await?;

    let mut seen = HashSet::new();
    let mut companies = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(raw) = row else {
            tracing::warn!(table, "skipping company row with NULL name");
            continue;
        };
        match CompanyName::new(raw) {
            Ok(name) => {
                if seen.insert(name.clone()) {
                    companies.push(name);
                } else {
                    tracing::warn!(table, company = %name, "skipping duplicate company row");
                }
            }
            Err(e) => tracing::warn!(table, "skipping company row: {}", e),
        }
    }

    tracing::debug!(table, count = companies.len(), "loaded company list");
    Ok(companies)
}
