//! In-process fakes for the browser, validator and resolver seams.

#![allow(dead_code)]

use esg_browser::{BrowserError, BrowserSession, PageElement, SessionLauncher};
use esg_core::{CompanyName, SearchConfig};
use esg_crawler::search;
use esg_crawler::{ArtifactValidator, AuditLog, CompanyResolver, Resolution, RunContext};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn company(name: &str) -> CompanyName {
    CompanyName::new(name).expect("valid company name")
}

pub async fn test_context(log_dir: &Path) -> RunContext {
    let audit = AuditLog::open(log_dir.join("test_log.txt"))
        .await
        .expect("open audit log");
    RunContext::new("Test", audit)
}

pub fn direct_search_url(config: &SearchConfig, company: &CompanyName) -> String {
    search::search_url(config, &search::direct_query(company, config))
}

pub fn webpage_search_url(config: &SearchConfig, company: &CompanyName) -> String {
    search::search_url(config, &search::webpage_query(company, config))
}

/// One anchor on a fake page.
#[derive(Debug, Clone)]
pub enum FakeLink {
    Anchor { href: String, text: String },
    Stale,
}

impl FakeLink {
    pub fn new(href: &str, text: &str) -> Self {
        Self::Anchor {
            href: href.to_string(),
            text: text.to_string(),
        }
    }

    pub fn href(href: &str) -> Self {
        Self::new(href, "")
    }
}

/// Pages keyed by exact URL, shared by every session of a launcher.
#[derive(Debug, Default)]
pub struct FakeWeb {
    pages: HashMap<String, Vec<FakeLink>>,
    navigations: Mutex<HashMap<String, u32>>,
}

impl FakeWeb {
    pub fn with_page(mut self, url: impl Into<String>, links: Vec<FakeLink>) -> Self {
        self.pages.insert(url.into(), links);
        self
    }

    pub fn navigations(&self, url: &str) -> u32 {
        self.navigations
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(0)
    }
}

pub struct FakeLauncher {
    web: Arc<FakeWeb>,
    fail_launch: bool,
    pub launched: AtomicUsize,
    pub closed: Arc<AtomicUsize>,
}

impl FakeLauncher {
    pub fn new(web: FakeWeb) -> Self {
        Self {
            web: Arc::new(web),
            fail_launch: false,
            launched: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::new(FakeWeb::default())
        }
    }

    pub fn web(&self) -> &FakeWeb {
        &self.web
    }

    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SessionLauncher for FakeLauncher {
    async fn launch(&self) -> esg_browser::Result<Box<dyn BrowserSession>> {
        self.launched.fetch_add(1, Ordering::SeqCst);
        if self.fail_launch {
            return Err(BrowserError::ChromiumError("no browser".to_string()));
        }
        Ok(Box::new(FakeSession {
            web: self.web.clone(),
            current: Mutex::new(None),
            closed: self.closed.clone(),
        }))
    }
}

struct FakeSession {
    web: Arc<FakeWeb>,
    current: Mutex<Option<String>>,
    closed: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&self, url: &str) -> esg_browser::Result<()> {
        *self
            .web
            .navigations
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;
        *self.current.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn wait_for_elements(
        &self,
        _selector: &str,
        _timeout: Duration,
    ) -> esg_browser::Result<Vec<Box<dyn PageElement>>> {
        let current = self.current.lock().unwrap().clone();
        let Some(links) = current.and_then(|url| self.web.pages.get(&url)) else {
            return Err(BrowserError::Timeout("no matching elements".to_string()));
        };
        Ok(links
            .iter()
            .cloned()
            .map(|link| Box::new(FakeElement(link)) as Box<dyn PageElement>)
            .collect())
    }

    async fn current_url(&self) -> esg_browser::Result<String> {
        self.current
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| BrowserError::NavigationError("no page loaded".to_string()))
    }

    async fn close(self: Box<Self>) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

struct FakeElement(FakeLink);

#[async_trait::async_trait]
impl PageElement for FakeElement {
    async fn attribute(&self, name: &str) -> esg_browser::Result<Option<String>> {
        match &self.0 {
            FakeLink::Anchor { href, .. } if name == "href" => Ok(Some(href.clone())),
            FakeLink::Anchor { .. } => Ok(None),
            FakeLink::Stale => Err(BrowserError::StaleElement("detached".to_string())),
        }
    }

    async fn visible_text(&self) -> esg_browser::Result<String> {
        match &self.0 {
            FakeLink::Anchor { text, .. } => Ok(text.clone()),
            FakeLink::Stale => Err(BrowserError::StaleElement("detached".to_string())),
        }
    }
}

/// Accepts a fixed set of URLs and records every candidate it sees.
pub struct FakeValidator {
    output_dir: PathBuf,
    accepted: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeValidator {
    pub fn new(output_dir: &Path, accepted: &[&str]) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            accepted: accepted.iter().map(ToString::to_string).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ArtifactValidator for FakeValidator {
    async fn validate_and_download(
        &self,
        _ctx: &RunContext,
        company: &CompanyName,
        url: &str,
    ) -> Option<PathBuf> {
        self.calls.lock().unwrap().push(url.to_string());
        self.accepted
            .contains(url)
            .then(|| self.output_dir.join(format!("{}.pdf", company.sanitized())))
    }
}

/// Scripted outcome of a fake resolution.
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Direct,
    Webpage,
    Fail,
    Panic,
}

/// Resolver returning scripted outcomes, writing an artifact on success.
pub struct FakeResolver {
    output_dir: PathBuf,
    outcomes: HashMap<String, Outcome>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeResolver {
    pub fn new(output_dir: &Path, outcomes: &[(&str, Outcome)]) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            outcomes: outcomes
                .iter()
                .map(|(name, outcome)| ((*name).to_string(), *outcome))
                .collect(),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }
}

#[async_trait::async_trait]
impl CompanyResolver for FakeResolver {
    async fn resolve(&self, _ctx: &RunContext, company: &CompanyName) -> Resolution {
        self.calls.lock().unwrap().push(company.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let artifact = self.output_dir.join(format!("{}.pdf", company.sanitized()));
        match self.outcomes.get(company.as_str()).copied() {
            Some(Outcome::Direct) => {
                std::fs::write(&artifact, b"%PDF-1.4").expect("write artifact");
                Resolution::Direct(artifact)
            }
            Some(Outcome::Webpage) => {
                std::fs::write(&artifact, b"%PDF-1.4").expect("write artifact");
                Resolution::Webpage(artifact)
            }
            Some(Outcome::Panic) => panic!("resolver crashed on {company}"),
            Some(Outcome::Fail) | None => Resolution::Failed,
        }
    }
}

/// Extractor returning a fixed text for every file.
pub struct FixedExtractor(pub &'static str);

#[async_trait::async_trait]
impl esg_crawler::TextExtractor for FixedExtractor {
    async fn extract_marked_pages(
        &self,
        _path: &Path,
        _markers: &[&str],
    ) -> esg_crawler::Result<String> {
        Ok(self.0.to_string())
    }
}

/// Extractor reading the file as text, one page per file.
pub struct ContentExtractor;

#[async_trait::async_trait]
impl esg_crawler::TextExtractor for ContentExtractor {
    async fn extract_marked_pages(
        &self,
        path: &Path,
        markers: &[&str],
    ) -> esg_crawler::Result<String> {
        let bytes = std::fs::read(path).expect("read artifact");
        let text = String::from_utf8_lossy(&bytes);
        Ok(esg_crawler::extractor::marked_pages(&[text], markers))
    }
}
