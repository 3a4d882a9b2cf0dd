use crate::error::{BrowserError, Result};
use std::time::Duration;

/// A rendered page driven by one browser session.
///
/// A session is owned by exactly one resolution task and must be closed on
/// every exit path.
#[async_trait::async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate to a URL
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Wait until at least one element matches `selector`, then return all
    /// matches in document order.
    async fn wait_for_elements(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<Box<dyn PageElement>>>;

    /// URL of the page currently loaded
    async fn current_url(&self) -> Result<String>;

    /// Release the underlying browser resources
    async fn close(self: Box<Self>);
}

/// Handle to a single element on a rendered page.
///
/// Handles can go stale when the page mutates; each accessor then fails with
/// [`BrowserError::StaleElement`] and callers skip the element.
#[async_trait::async_trait]
pub trait PageElement: Send + Sync {
    /// Read an attribute, preferring the resolved DOM property when present
    async fn attribute(&self, name: &str) -> Result<Option<String>>;

    /// Rendered text of the element
    async fn visible_text(&self) -> Result<String>;
}

/// Factory for fresh, exclusively owned browser sessions.
#[async_trait::async_trait]
pub trait SessionLauncher: Send + Sync {
    /// Launch a new session
    async fn launch(&self) -> Result<Box<dyn BrowserSession>>;
}

/// Resolve an `href` against the page it was found on.
///
/// Absolute hrefs are returned unchanged; `javascript:`/`mailto:` and other
/// non-HTTP schemes are rejected.
pub fn resolve_href(base: &str, href: &str) -> Result<String> {
    let base = url::Url::parse(base)
        .map_err(|e| BrowserError::NavigationError(format!("Invalid URL: {}", e)))?;
    let resolved = base
        .join(href.trim())
        .map_err(|e| BrowserError::NavigationError(format!("Invalid href '{}': {}", href, e)))?;

    match resolved.scheme() {
        "http" | "https" => Ok(resolved.to_string()),
        other => Err(BrowserError::NavigationError(format!(
            "Unsupported scheme '{}' in href '{}'",
            other, href
        ))),
    }
}
