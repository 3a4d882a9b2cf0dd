//! ESG Crawler - Sustainability report discovery and batch orchestration.
//!
//! This crate resolves each registry company to a validated sustainability
//! report PDF. A resolution first searches for report PDFs directly and falls
//! back to scanning report webpages for linked PDFs. Every candidate must
//! download cleanly and mention an emission scope before it is kept.
//!
//! # Features
//!
//! - Bounded retry of navigation, element waits and downloads
//! - Deterministic batch partitioning with resume from existing artifacts
//! - Fixed-size worker pool with per-task failure isolation
//! - Per-run audit log and summary report
//!
//! # Example
//!
//! ```rust,ignore
//! use esg_crawler::{BatchOrchestrator, Resolver};
//! use std::sync::Arc;
//!
//! let orchestrator = BatchOrchestrator::new(
//!     Arc::new(registry),
//!     Arc::new(resolver),
//!     config.paths.clone(),
//!     config.batch.clone(),
//! );
//!
//! let stats = orchestrator.run_batch("emissions_data", 10, 1).await?;
//! println!("{} of {} resolved", stats.direct_success + stats.webpage_success, stats.total);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod audit;
pub mod context;
#[allow(missing_docs)]
pub mod error;
pub mod extractor;
pub mod orchestrator;
pub mod report;
pub mod resolver;
pub mod retry;
pub mod search;
pub mod stats;
pub mod validator;

// Re-export commonly used types
pub use audit::AuditLog;
pub use context::RunContext;
pub use error::{CrawlError, Result};
pub use extractor::{PdfTextExtractor, TextExtractor, SCOPE_MARKERS};
pub use orchestrator::{dispatch, filter_resumable, partition, BatchOrchestrator};
pub use resolver::{CompanyResolver, Resolution, Resolver};
pub use retry::{AttemptFailure, RetryExhausted, RetryPolicy};
pub use stats::{RunStats, TaskReport};
pub use validator::{ArtifactValidator, PdfValidator};
