//! Configuration management for the harvester.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use crate::types::CompanyName;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/esg-harvester/config.toml` (or platform
/// equivalent). If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Artifact, log and registry locations
    pub paths: PathsConfig,
    /// Search engine query settings
    pub search: SearchConfig,
    /// Bounded retry settings shared by every I/O call site
    pub retry: RetryConfig,
    /// Artifact download settings
    pub http: HttpConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Batch orchestration settings
    pub batch: BatchConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, falling back to defaults if absent.
    pub fn load_from(config_path: &Path) -> ConfigResult<Self> {
        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `ESG_OUTPUT_DIR`: Override the artifact directory
    /// - `ESG_LOG_DIR`: Override the batch log directory
    /// - `ESG_DATABASE_PATH`: Override the company registry database
    /// - `ESG_REPORT_YEAR`: Override the target report year
    /// - `ESG_HEADLESS`: Override browser headless mode (true/false)
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `ESG_*` environment overrides onto this configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ESG_OUTPUT_DIR") {
            tracing::debug!("Override paths.output_dir from env: {}", val);
            self.paths.output_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("ESG_LOG_DIR") {
            tracing::debug!("Override paths.log_dir from env: {}", val);
            self.paths.log_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("ESG_DATABASE_PATH") {
            tracing::debug!("Override paths.database_path from env: {}", val);
            self.paths.database_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("ESG_REPORT_YEAR") {
            if let Ok(year) = val.parse() {
                self.search.report_year = year;
                tracing::debug!("Override search.report_year from env: {}", year);
            }
        }

        if let Ok(val) = std::env::var("ESG_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }
    }

    /// Reject values the orchestrator cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        fn invalid(field: &str, reason: &str) -> ConfigError {
            ConfigError::InvalidValue {
                field: field.to_string(),
                reason: reason.to_string(),
            }
        }

        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts", "must be at least 1"));
        }
        if self.batch.workers == 0 {
            return Err(invalid("batch.workers", "must be at least 1"));
        }
        if self.batch.backfill_workers == 0 {
            return Err(invalid("batch.backfill_workers", "must be at least 1"));
        }
        if self.batch.total_batches == 0 {
            return Err(invalid("batch.total_batches", "must be at least 1"));
        }
        if self.batch.attempt_rounds == 0 {
            return Err(invalid("batch.attempt_rounds", "must be at least 1"));
        }
        if self.paths.output_dir.as_os_str().is_empty() {
            return Err(invalid("paths.output_dir", "must not be empty"));
        }
        if self.paths.log_dir.as_os_str().is_empty() {
            return Err(invalid("paths.log_dir", "must not be empty"));
        }
        if !is_header_value(&self.http.accept) {
            return Err(invalid("http.accept", "must be printable ASCII"));
        }
        if !is_header_value(&self.http.user_agent) {
            return Err(invalid("http.user_agent", "must be printable ASCII"));
        }
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/esg-harvester/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "esg-harvester", "esg-harvester")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Whether `value` can be sent verbatim as an HTTP header value.
fn is_header_value(value: &str) -> bool {
    value
        .bytes()
        .all(|b| b == b'\t' || (0x20..0x7f).contains(&b))
}

/// Artifact, log and registry locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding `<sanitized name>.pdf` artifacts
    pub output_dir: PathBuf,
    /// Directory holding batch logs and summaries
    pub log_dir: PathBuf,
    /// `SQLite` database holding the company list
    pub database_path: PathBuf,
}

impl PathsConfig {
    /// Artifact path for a company: `<output_dir>/<sanitized name>.pdf`.
    #[must_use]
    pub fn artifact_path(&self, company: &CompanyName) -> PathBuf {
        self.output_dir.join(format!("{}.pdf", company.sanitized()))
    }

    /// Ledger of companies still lacking an artifact.
    #[must_use]
    pub fn missing_reports_path(&self) -> PathBuf {
        self.output_dir.join("_missing_reports.txt")
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./reports"),
            log_dir: PathBuf::from("./logs"),
            database_path: PathBuf::from("./companies.db"),
        }
    }
}

/// Search engine query settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search endpoint, queried as `<engine_url>?q=...`
    pub engine_url: String,
    /// Report year targeted by the direct PDF search
    pub report_year: u16,
    /// Site excluded from both queries with a `-site` term
    pub excluded_site: String,
    /// CSS selector for result anchors on the search page
    pub result_selector: String,
    /// Number of non-PDF result pages scanned by the webpage fallback
    pub max_webpages: usize,
    /// Number of in-page PDF candidates validated per webpage
    pub max_page_candidates: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            engine_url: "https://www.bing.com/search".to_string(),
            report_year: 2024,
            excluded_site: "responsibilityreports".to_string(),
            result_selector: ".b_algo h2 a".to_string(),
            max_webpages: 3,
            max_page_candidates: 10,
        }
    }
}

/// Bounded retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per operation, including the first
    pub max_attempts: u32,
    /// Fixed delay between attempts in milliseconds
    pub delay_ms: u64,
}

impl RetryConfig {
    /// Delay between attempts.
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 2000,
        }
    }
}

/// Artifact download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent sent with downloads
    pub user_agent: String,
    /// Accept header sent with downloads
    pub accept: String,
    /// Tolerate invalid TLS certificates on report hosts
    pub accept_invalid_certs: bool,
}

impl HttpConfig {
    /// Request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"
                .to_string(),
            accept: "application/pdf".to_string(),
            accept_invalid_certs: true,
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Timeout for elements to appear after navigation, in seconds
    pub wait_timeout_secs: u64,
}

impl BrowserConfig {
    /// Element wait timeout.
    #[must_use]
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            wait_timeout_secs: 30,
        }
    }
}

/// Batch orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Registry table holding the company list
    pub table_name: String,
    /// Worker pool size for scheduled batches
    pub workers: usize,
    /// Worker pool size for missing-report backfill runs
    pub backfill_workers: usize,
    /// Number of partitions of the company list
    pub total_batches: usize,
    /// Number of times the full batch sequence is repeated
    pub attempt_rounds: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            table_name: "emissions_data".to_string(),
            workers: 5,
            backfill_workers: 4,
            total_batches: 10,
            attempt_rounds: 8,
        }
    }
}
