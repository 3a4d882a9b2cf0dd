use crate::actions::{BrowserSession, PageElement, SessionLauncher};
use crate::error::{BrowserError, Result};
use crate::fingerprint::FingerprintConfig;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use esg_core::BrowserConfig;
use futures_util::stream::StreamExt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Poll interval while waiting for elements to render
const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Launches one headless Chromium process per session
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    config: BrowserConfig,
}

impl ChromeLauncher {
    /// Launcher using the `[browser]` settings
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl SessionLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        let session = ChromeSession::launch(&self.config).await?;
        Ok(Box::new(session))
    }
}

/// A Chromium process with a single page
pub struct ChromeSession {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromeSession {
    /// Launch a browser with a randomized desktop fingerprint
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let fingerprint = FingerprintConfig::randomized(config);

        let mut builder = ChromeConfig::builder()
            .no_sandbox()
            .window_size(fingerprint.viewport_width, fingerprint.viewport_height)
            .args(fingerprint.launch_args());
        if !config.headless {
            builder = builder.with_head();
        }
        let chrome_config = builder.build().map_err(BrowserError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(chrome_config).await?;

        // Spawn browser handler
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                // Handle events if needed
                let _ = event;
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(e.into());
            }
        };

        tracing::debug!(user_agent = %fingerprint.user_agent, "browser session launched");

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
        })
    }
}

#[async_trait::async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationError(format!("{url}: {e}")))?;
        Ok(())
    }

    async fn wait_for_elements(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<Box<dyn PageElement>>> {
        let poll = async {
            loop {
                if let Ok(elements) = self.page.find_elements(selector).await {
                    if !elements.is_empty() {
                        return elements;
                    }
                }
                tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
            }
        };

        let elements = tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| BrowserError::Timeout(format!("'{selector}' after {timeout:?}")))?;

        Ok(elements
            .into_iter()
            .map(|element| Box::new(ChromeElement { element }) as Box<dyn PageElement>)
            .collect())
    }

    async fn current_url(&self) -> Result<String> {
        let url = self.page.url().await?;
        url.ok_or_else(|| BrowserError::NavigationError("page has no URL".to_string()))
    }

    async fn close(self: Box<Self>) {
        let Self {
            browser,
            page,
            handler,
        } = *self;

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close page: {}", e);
        }

        let mut browser = browser.into_inner();
        if let Err(e) = browser.close().await {
            tracing::warn!("Failed to close browser: {}", e);
        }
        if let Err(e) = browser.wait().await {
            tracing::warn!("Failed to reap browser process: {}", e);
        }
        handler.abort();
    }
}

struct ChromeElement {
    element: Element,
}

#[async_trait::async_trait]
impl PageElement for ChromeElement {
    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        // Properties carry resolved absolute URLs for href/src
        let property = self
            .element
            .property(name)
            .await
            .map_err(|e| BrowserError::StaleElement(e.to_string()))?;
        if let Some(serde_json::Value::String(value)) = property {
            return Ok(Some(value));
        }

        self.element
            .attribute(name)
            .await
            .map_err(|e| BrowserError::StaleElement(e.to_string()))
    }

    async fn visible_text(&self) -> Result<String> {
        let text = self
            .element
            .inner_text()
            .await
            .map_err(|e| BrowserError::StaleElement(e.to_string()))?;
        Ok(text.unwrap_or_default())
    }
}
