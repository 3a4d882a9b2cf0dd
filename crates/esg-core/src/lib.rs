//! ESG Core - Foundation crate for the ESG report harvester.
//!
//! This crate provides the shared types, error handling and configuration
//! management that the browser, registry and crawler crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes and enums (`CompanyName`, `TaskStatus`, `CompanyTask`, `CandidateLink`)
//!
//! # Example
//!
//! ```rust
//! use esg_core::{AppConfig, CompanyName};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let company = CompanyName::new("Acme Corp")?;
//!
//! let artifact = config.paths.artifact_path(&company);
//! assert!(artifact.ends_with("Acme_Corp-a73cb456.pdf"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, BatchConfig, BrowserConfig, HttpConfig, PathsConfig, RetryConfig, SearchConfig,
};
pub use error::{ConfigError, ConfigResult, EsgError, Result};
pub use types::{CandidateLink, CompanyName, CompanyTask, TaskStatus};
