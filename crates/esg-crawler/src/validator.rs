//! Candidate download and content validation.
//!
//! A candidate becomes an artifact only if it looks like a PDF, downloads
//! with HTTP 200 within the retry budget, and contains at least one page
//! with an emission scope marker. Anything else leaves no file behind.

use crate::context::RunContext;
use crate::error::{CrawlError, Result};
use crate::extractor::{TextExtractor, SCOPE_MARKERS};
use crate::retry::{accept_any, RetryPolicy};
use esg_core::types::looks_like_pdf;
use esg_core::{CompanyName, HttpConfig};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Downloads a candidate URL and keeps it only if its content qualifies.
#[async_trait::async_trait]
pub trait ArtifactValidator: Send + Sync {
    /// Path of the validated artifact, or `None` if the candidate was rejected.
    async fn validate_and_download(
        &self,
        ctx: &RunContext,
        company: &CompanyName,
        url: &str,
    ) -> Option<PathBuf>;
}

/// HTTP validator writing artifacts to `<output_dir>/<sanitized name>.pdf`.
pub struct PdfValidator {
    client: reqwest::Client,
    extractor: Arc<dyn TextExtractor>,
    output_dir: PathBuf,
    retry: RetryPolicy,
}

impl PdfValidator {
    /// Build the validator's HTTP client from the `[http]` settings.
    pub fn new(
        http: &HttpConfig,
        output_dir: impl Into<PathBuf>,
        retry: RetryPolicy,
        extractor: Arc<dyn TextExtractor>,
    ) -> Result<Self> {
        let accept = HeaderValue::from_str(&http.accept)
            .map_err(|e| CrawlError::InvalidSetting(format!("http.accept: {e}")))?;
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, accept);

        let client = reqwest::Client::builder()
            .user_agent(http.user_agent.clone())
            .default_headers(headers)
            .danger_accept_invalid_certs(http.accept_invalid_certs)
            .timeout(http.timeout())
            .build()?;

        Ok(Self {
            client,
            extractor,
            output_dir: output_dir.into(),
            retry,
        })
    }

    /// Artifact path for a company.
    #[must_use]
    pub fn artifact_path(&self, company: &CompanyName) -> PathBuf {
        self.output_dir.join(format!("{}.pdf", company.sanitized()))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(CrawlError::Status(response.status().as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn persist(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ArtifactValidator for PdfValidator {
    async fn validate_and_download(
        &self,
        ctx: &RunContext,
        company: &CompanyName,
        url: &str,
    ) -> Option<PathBuf> {
        let audit = ctx.audit();

        if !looks_like_pdf(url) {
            audit.record_url(company, "Is not a PDF URL", url).await;
            return None;
        }

        let path = self.artifact_path(company);

        let bytes = match self.retry.run(|| self.fetch(url), accept_any).await {
            Ok(bytes) => bytes,
            Err(exhausted) => {
                remove_artifact(&path).await;
                audit
                    .record_url(
                        company,
                        format!("Failed to download PDF: {exhausted}"),
                        url,
                    )
                    .await;
                return None;
            }
        };

        if let Err(e) = self.persist(&path, &bytes).await {
            remove_artifact(&path).await;
            audit
                .record_url(company, format!("PDF Processing Error | Error: {e}"), url)
                .await;
            return None;
        }

        match self
            .extractor
            .extract_marked_pages(&path, &SCOPE_MARKERS)
            .await
        {
            Ok(text) if !text.trim().is_empty() => {
                audit.record_url(company, "Valid PDF downloaded", url).await;
                Some(path)
            }
            Ok(_) => {
                remove_artifact(&path).await;
                audit
                    .record_url(
                        company,
                        "PDF content does not contain 'scope 1' or 'scope 2'",
                        url,
                    )
                    .await;
                None
            }
            Err(e) => {
                remove_artifact(&path).await;
                audit
                    .record_url(company, format!("PDF Processing Error | Error: {e}"), url)
                    .await;
                None
            }
        }
    }
}

/// Delete a rejected or partial artifact if present.
async fn remove_artifact(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!("Removed rejected artifact {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
    }
}
