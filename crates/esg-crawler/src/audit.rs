//! Append-only audit log for one run.
//!
//! Every validator attempt and resolver milestone appends exactly one
//! timestamped line. Lines from concurrent workers never interleave because
//! appends are serialized through a mutex.

use crate::error::Result;
use chrono::Local;
use esg_core::CompanyName;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Delimiter line bracketing batches in logs and summaries.
pub const DELIMITER: &str = "==================================================";

/// Timestamp format used in audit lines and delimiters.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only log file shared by all workers of a run.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl AuditLog {
    /// Open (or create) the log at `path`, creating parent directories.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a company event: `[ts] <company>: <message>`.
    pub async fn record(&self, company: &CompanyName, message: impl Display) {
        tracing::info!(company = %company, "{}", message);
        self.append(&format!("[{}] {}: {}\n", timestamp(), company, message))
            .await;
    }

    /// Record a company event about a URL: `[ts] <company>: <message> | URL: <url>`.
    pub async fn record_url(&self, company: &CompanyName, message: impl Display, url: &str) {
        tracing::info!(company = %company, url, "{}", message);
        self.append(&format!(
            "[{}] {}: {} | URL: {}\n",
            timestamp(),
            company,
            message,
            url
        ))
        .await;
    }

    /// Bracket line: delimiter, `<label>: <ts>`, delimiter.
    pub async fn delimit(&self, label: &str) {
        self.append(&format!("{DELIMITER}\n{label}: {}\n{DELIMITER}\n", timestamp()))
            .await;
    }

    /// Append raw text. Failures are reported through tracing only, so a
    /// broken log never aborts a resolution.
    async fn append(&self, text: &str) {
        let _guard = self.write_lock.lock().await;
        if let Err(e) = append_to(&self.path, text).await {
            tracing::warn!("Failed to write audit log {}: {}", self.path.display(), e);
        }
    }
}

fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Append `text` to the file at `path`, creating it if needed.
pub(crate) async fn append_to(path: &Path, text: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(text.as_bytes()).await?;
    file.flush().await
}
