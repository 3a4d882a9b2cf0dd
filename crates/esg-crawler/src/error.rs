use esg_browser::BrowserError;
use esg_registry::RegistryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Invalid HTTP setting {0}")]
    InvalidSetting(String),

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Invalid batch {batch_num} of {total_batches}")]
    InvalidBatch {
        batch_num: usize,
        total_batches: usize,
    },

    #[error("Statistics aggregator failed: {0}")]
    Aggregator(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CrawlError>;
