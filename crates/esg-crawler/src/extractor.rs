//! Text extraction from downloaded PDFs.
//!
//! The validator only consumes the empty/non-empty signal of
//! [`TextExtractor::extract_marked_pages`].

use crate::error::{CrawlError, Result};
use std::path::Path;

/// Emission disclosure markers a sustainability report must contain.
pub const SCOPE_MARKERS: [&str; 2] = ["scope 1", "scope 2"];

/// Extracts the text of pages containing target markers.
#[async_trait::async_trait]
pub trait TextExtractor: Send + Sync {
    /// Text of every page of `path` containing at least one of `markers`
    /// (case-insensitive); empty when no page matches.
    async fn extract_marked_pages(&self, path: &Path, markers: &[&str]) -> Result<String>;
}

/// Extractor built on `pdf-extract`, run on the blocking thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

#[async_trait::async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract_marked_pages(&self, path: &Path, markers: &[&str]) -> Result<String> {
        let owned_path = path.to_path_buf();
        let pages =
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_by_pages(&owned_path))
                .await
                .map_err(|e| CrawlError::Extraction(format!("extraction task aborted: {e}")))?
                .map_err(|e| CrawlError::Extraction(format!("{}: {e:?}", path.display())))?;

        Ok(marked_pages(&pages, markers))
    }
}

/// Keep the pages that contain one of `markers`, joined by newlines.
#[must_use]
pub fn marked_pages<S: AsRef<str>>(pages: &[S], markers: &[&str]) -> String {
    let markers: Vec<String> = markers.iter().map(|m| m.to_lowercase()).collect();

    pages
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|page| {
            let page = page.to_lowercase();
            markers.iter().any(|marker| page.contains(marker.as_str()))
        })
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
}
