//! Browser automation for search result and report page scanning.
//!
//! Provides the session capability the crawler drives (navigate, then wait for
//! elements) and a headless Chromium implementation with a spoofed desktop
//! fingerprint. Each session owns its own browser process.

pub mod actions;
pub mod engine;
pub mod error;
pub mod fingerprint;

pub use actions::{resolve_href, BrowserSession, PageElement, SessionLauncher};
pub use engine::{ChromeLauncher, ChromeSession};
pub use error::{BrowserError, Result};
pub use fingerprint::FingerprintConfig;
