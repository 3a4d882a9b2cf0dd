//! Shared types used across the harvester.
//!
//! This module defines the company newtype, the per-company task record and
//! the candidate link type that flows between the search stages and the
//! validator.

use crate::error::EsgError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Hex digits of the name digest appended to lossy artifact stems
const STEM_DIGEST_LEN: usize = 8;

/// Newtype for company names as they appear in the registry.
///
/// Names are trimmed and must not be empty. The registry name is the unique
/// key of a task; [`CompanyName::sanitized`] gives the filesystem-safe form
/// used for artifact paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompanyName(String);

impl CompanyName {
    /// Create a new `CompanyName` from a string.
    ///
    /// # Errors
    /// Returns error if the name is empty after trimming.
    pub fn new(name: impl Into<String>) -> Result<Self, EsgError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(EsgError::Validation(
                "invalid company name: must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe identifier for this company.
    ///
    /// Every character outside `[A-Za-z0-9_-]` becomes `_`, runs are kept,
    /// and leading/trailing underscores are trimmed. A name with no safe
    /// characters at all maps to `company`. Whenever this loses information
    /// the stem gets a `-<sha256 prefix>` suffix of the raw name, so two
    /// registry names never share an artifact ("A&B" and "A B" differ).
    #[must_use]
    pub fn sanitized(&self) -> String {
        static UNSAFE_CHARS: OnceLock<Regex> = OnceLock::new();
        let regex = UNSAFE_CHARS
            .get_or_init(|| Regex::new(r"[^A-Za-z0-9_-]").expect("valid regex"));

        let replaced = regex.replace_all(&self.0, "_");
        let stem = match replaced.trim_matches('_') {
            "" => "company",
            trimmed => trimmed,
        };

        if stem == self.0 {
            stem.to_string()
        } else {
            format!("{stem}-{}", self.digest())
        }
    }

    fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        let mut digest = hex::encode(hasher.finalize());
        digest.truncate(STEM_DIGEST_LEN);
        digest
    }
}

impl fmt::Display for CompanyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CompanyName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolution status of a single company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not yet processed
    Pending,
    /// Resolved from a direct PDF search result
    ResolvedDirect,
    /// Resolved from a PDF linked on a report webpage
    ResolvedWebpage,
    /// Every stage was exhausted without a valid artifact
    Failed,
}

impl TaskStatus {
    /// Whether this status is one of the resolved variants.
    #[must_use]
    pub fn is_resolved(self) -> bool {
        matches!(self, Self::ResolvedDirect | Self::ResolvedWebpage)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::ResolvedDirect => write!(f, "resolved_direct"),
            Self::ResolvedWebpage => write!(f, "resolved_webpage"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Per-company unit of work for one orchestrated run.
///
/// The artifact path is present if and only if the status is resolved; the
/// fields are private so the only way to set a path is through one of the
/// `resolve_*` transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyTask {
    company_name: CompanyName,
    status: TaskStatus,
    artifact_path: Option<PathBuf>,
}

impl CompanyTask {
    /// Create a pending task for a company.
    #[must_use]
    pub fn new(company_name: CompanyName) -> Self {
        Self {
            company_name,
            status: TaskStatus::Pending,
            artifact_path: None,
        }
    }

    /// Company this task resolves.
    #[must_use]
    pub fn company_name(&self) -> &CompanyName {
        &self.company_name
    }

    /// Consume the task, keeping only its company.
    #[must_use]
    pub fn into_company_name(self) -> CompanyName {
        self.company_name
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Path of the validated artifact, set only for resolved tasks.
    #[must_use]
    pub fn artifact_path(&self) -> Option<&Path> {
        self.artifact_path.as_deref()
    }

    /// Mark as resolved by the direct PDF search.
    pub fn resolve_direct(&mut self, path: PathBuf) {
        self.status = TaskStatus::ResolvedDirect;
        self.artifact_path = Some(path);
    }

    /// Mark as resolved by the webpage fallback.
    pub fn resolve_webpage(&mut self, path: PathBuf) {
        self.status = TaskStatus::ResolvedWebpage;
        self.artifact_path = Some(path);
    }

    /// Mark as failed, clearing any artifact path.
    pub fn fail(&mut self) {
        self.status = TaskStatus::Failed;
        self.artifact_path = None;
    }
}

/// A URL under consideration, with the visible text of the anchor it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateLink {
    /// Absolute URL of the candidate
    pub url: String,
    /// Visible anchor text, if any was available
    pub text: Option<String>,
}

impl CandidateLink {
    /// Create a candidate without anchor text.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: None,
        }
    }

    /// Create a candidate carrying the anchor's visible text.
    #[must_use]
    pub fn with_text(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: Some(text.into()),
        }
    }

    /// Whether the URL passes the PDF heuristic.
    #[must_use]
    pub fn looks_like_pdf(&self) -> bool {
        looks_like_pdf(&self.url)
    }
}

/// PDF heuristic: case-insensitive `.pdf` substring anywhere in the URL.
///
/// Query strings such as `download?file=report.PDF` count as PDFs too.
#[must_use]
pub fn looks_like_pdf(url: &str) -> bool {
    url.to_ascii_lowercase().contains(".pdf")
}
