//! Per-company resolution state machine.
//!
//! ```text
//! START -> STAGE_A (direct PDF search) -> RESOLVED
//!              |
//!              v
//!          STAGE_B (webpage search + in-page PDF discovery) -> RESOLVED | FAILED
//! ```
//!
//! Each resolution owns one browser session for its whole lifetime.

use crate::context::RunContext;
use crate::retry::{accept_any, accept_non_empty, RetryPolicy};
use crate::search::{self, ANCHOR_SELECTOR};
use crate::validator::ArtifactValidator;
use esg_browser::{resolve_href, BrowserSession, PageElement, SessionLauncher};
use esg_core::{CandidateLink, CompanyName, CompanyTask, SearchConfig, TaskStatus};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Final state of one company's resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Validated artifact found by the direct PDF search
    Direct(PathBuf),
    /// Validated artifact found on a report webpage
    Webpage(PathBuf),
    /// Every stage exhausted without a validated artifact
    Failed,
}

impl Resolution {
    /// Task status corresponding to this resolution.
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        match self {
            Self::Direct(_) => TaskStatus::ResolvedDirect,
            Self::Webpage(_) => TaskStatus::ResolvedWebpage,
            Self::Failed => TaskStatus::Failed,
        }
    }

    /// Artifact path, present only when resolved.
    #[must_use]
    pub fn artifact_path(&self) -> Option<&Path> {
        match self {
            Self::Direct(path) | Self::Webpage(path) => Some(path),
            Self::Failed => None,
        }
    }

    /// Move `task` into the final state this resolution describes.
    pub fn settle(self, task: &mut CompanyTask) {
        match self {
            Self::Direct(path) => task.resolve_direct(path),
            Self::Webpage(path) => task.resolve_webpage(path),
            Self::Failed => task.fail(),
        }
    }
}

/// Resolves a company to a validated report artifact.
#[async_trait::async_trait]
pub trait CompanyResolver: Send + Sync {
    /// Run every discovery stage for `company`. Never fails: exhaustion is
    /// reported as [`Resolution::Failed`].
    async fn resolve(&self, ctx: &RunContext, company: &CompanyName) -> Resolution;
}

/// Browser-driven resolver cascading the direct search and webpage fallback.
pub struct Resolver {
    launcher: Arc<dyn SessionLauncher>,
    validator: Arc<dyn ArtifactValidator>,
    search: SearchConfig,
    retry: RetryPolicy,
    wait_timeout: Duration,
}

impl Resolver {
    /// Create a resolver.
    #[must_use]
    pub fn new(
        launcher: Arc<dyn SessionLauncher>,
        validator: Arc<dyn ArtifactValidator>,
        search: SearchConfig,
        retry: RetryPolicy,
        wait_timeout: Duration,
    ) -> Self {
        Self {
            launcher,
            validator,
            search,
            retry,
            wait_timeout,
        }
    }

    async fn resolve_with_session(
        &self,
        ctx: &RunContext,
        company: &CompanyName,
        session: &dyn BrowserSession,
    ) -> Resolution {
        if let Some(path) = self.direct_search(ctx, company, session).await {
            return Resolution::Direct(path);
        }

        if let Some(path) = self.webpage_search(ctx, company, session).await {
            return Resolution::Webpage(path);
        }

        ctx.audit()
            .record(company, "No valid PDF found by any search stage")
            .await;
        Resolution::Failed
    }

    /// Stage A: search for report PDFs directly.
    async fn direct_search(
        &self,
        ctx: &RunContext,
        company: &CompanyName,
        session: &dyn BrowserSession,
    ) -> Option<PathBuf> {
        let query = search::direct_query(company, &self.search);
        let url = search::search_url(&self.search, &query);
        ctx.audit()
            .record_url(company, "Searching PDF in search engine", &url)
            .await;

        let results = self
            .fetch_elements(ctx, company, session, &url, &self.search.result_selector)
            .await?;

        let pdf_links: Vec<CandidateLink> = search::dedupe_links(
            collect_links(session, &url, &results, false)
                .await
                .into_iter()
                .filter(CandidateLink::looks_like_pdf)
                .collect(),
        );

        if pdf_links.is_empty() {
            ctx.audit()
                .record_url(company, "No PDF Links Found in Search Results", &url)
                .await;
            return None;
        }

        for link in &pdf_links {
            if let Some(path) = self
                .validator
                .validate_and_download(ctx, company, &link.url)
                .await
            {
                return Some(path);
            }
        }

        ctx.audit()
            .record(company, "No Valid PDF Found in Search Results")
            .await;
        None
    }

    /// Stage B: search for report webpages and scan them for linked PDFs.
    async fn webpage_search(
        &self,
        ctx: &RunContext,
        company: &CompanyName,
        session: &dyn BrowserSession,
    ) -> Option<PathBuf> {
        let query = search::webpage_query(company, &self.search);
        let url = search::search_url(&self.search, &query);
        ctx.audit()
            .record_url(company, "Searching Webpage in search engine", &url)
            .await;

        let results = self
            .fetch_elements(ctx, company, session, &url, &self.search.result_selector)
            .await?;

        let mut webpages = Vec::new();
        for result in &results {
            if webpages.len() >= self.search.max_webpages {
                break;
            }
            match result.attribute("href").await {
                Ok(Some(href)) => match resolve_href(&url, &href) {
                    Ok(link) if !esg_core::types::looks_like_pdf(&link) => webpages.push(link),
                    Ok(_) => {}
                    Err(e) => tracing::debug!(company = %company, "Skipping result link: {}", e),
                },
                Ok(None) => {}
                Err(e) => {
                    ctx.audit()
                        .record(company, format!("Error getting URL from search result: {e}"))
                        .await;
                }
            }
        }

        if webpages.is_empty() {
            ctx.audit()
                .record(company, "No Valid URL Found in Search Results")
                .await;
            return None;
        }

        for page in &webpages {
            if let Some(path) = self.scan_webpage(ctx, company, session, page).await {
                return Some(path);
            }
        }
        None
    }

    /// Find keyword-qualified PDF links on one webpage and validate them in order.
    async fn scan_webpage(
        &self,
        ctx: &RunContext,
        company: &CompanyName,
        session: &dyn BrowserSession,
        page_url: &str,
    ) -> Option<PathBuf> {
        ctx.audit()
            .record_url(company, "Searching PDF in Webpage", page_url)
            .await;

        let anchors = self
            .fetch_elements(ctx, company, session, page_url, ANCHOR_SELECTOR)
            .await?;

        let candidates: Vec<CandidateLink> = search::dedupe_links(
            collect_links(session, page_url, &anchors, true)
                .await
                .into_iter()
                .filter(search::is_report_candidate)
                .collect(),
        );

        ctx.audit()
            .record(company, format!("Found {} PDF on webpage.", candidates.len()))
            .await;
        if candidates.is_empty() {
            return None;
        }

        for candidate in candidates.iter().take(self.search.max_page_candidates) {
            if let Some(path) = self
                .validator
                .validate_and_download(ctx, company, &candidate.url)
                .await
            {
                return Some(path);
            }
        }

        ctx.audit()
            .record(company, "No Valid PDF Found in Webpage")
            .await;
        None
    }

    /// Navigate and wait for `selector`, retrying faults and empty pages.
    async fn fetch_elements(
        &self,
        ctx: &RunContext,
        company: &CompanyName,
        session: &dyn BrowserSession,
        url: &str,
        selector: &str,
    ) -> Option<Vec<Box<dyn PageElement>>> {
        let timeout = self.wait_timeout;
        let fetched = self
            .retry
            .run(
                || async move {
                    session.navigate(url).await?;
                    session.wait_for_elements(selector, timeout).await
                },
                accept_non_empty,
            )
            .await;

        match fetched {
            Ok(elements) => Some(elements),
            Err(exhausted) => {
                ctx.audit()
                    .record_url(
                        company,
                        format!("Failed to get search results: {exhausted}"),
                        url,
                    )
                    .await;
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl CompanyResolver for Resolver {
    async fn resolve(&self, ctx: &RunContext, company: &CompanyName) -> Resolution {
        let launched = self
            .retry
            .run(|| self.launcher.launch(), accept_any)
            .await;
        let session = match launched {
            Ok(session) => session,
            Err(exhausted) => {
                ctx.audit()
                    .record(company, format!("Failed to start browser session: {exhausted}"))
                    .await;
                return Resolution::Failed;
            }
        };

        let resolution = self
            .resolve_with_session(ctx, company, session.as_ref())
            .await;

        // Released on every non-panicking path; a panic drops the session,
        // which kills the browser process.
        session.close().await;
        resolution
    }
}

/// Read `href` (and optionally visible text) from each element, resolving
/// relative links against the page. Stale elements are skipped.
async fn collect_links(
    session: &dyn BrowserSession,
    page_url: &str,
    elements: &[Box<dyn PageElement>],
    with_text: bool,
) -> Vec<CandidateLink> {
    let base = session
        .current_url()
        .await
        .unwrap_or_else(|_| page_url.to_string());

    let mut links = Vec::with_capacity(elements.len());
    for element in elements {
        let href = match element.attribute("href").await {
            Ok(Some(href)) if !href.trim().is_empty() => href,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!("Skipping stale element: {}", e);
                continue;
            }
        };
        let Ok(url) = resolve_href(&base, &href) else {
            continue;
        };

        if with_text {
            match element.visible_text().await {
                Ok(text) => links.push(CandidateLink::with_text(url, text)),
                Err(e) => tracing::debug!("Skipping stale element: {}", e),
            }
        } else {
            links.push(CandidateLink::new(url));
        }
    }
    links
}
