//! Per-run context handed to the resolver and validator.

use crate::audit::AuditLog;
use uuid::Uuid;

/// State owned by one orchestrated run.
///
/// Replaces process-wide "current log" state so independent runs (and tests)
/// can proceed side by side.
#[derive(Debug)]
pub struct RunContext {
    run_id: Uuid,
    label: String,
    audit: AuditLog,
}

impl RunContext {
    /// Create a context for a run writing to `audit`.
    #[must_use]
    pub fn new(label: impl Into<String>, audit: AuditLog) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            label: label.into(),
            audit,
        }
    }

    /// Unique identifier of this run.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Human-readable run label, e.g. `Batch 3`.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Append-only audit log of this run.
    #[must_use]
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }
}
