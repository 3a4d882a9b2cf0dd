//! Run statistics and their single-owner aggregator.
//!
//! Workers never touch [`RunStats`] directly: each finished task is sent as a
//! [`TaskReport`] to one aggregator task that owns the counters exclusively.

use esg_core::{CompanyName, CompanyTask, TaskStatus};
use std::collections::BTreeSet;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Aggregate outcome of one orchestrated run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Companies dispatched to workers (after the resume filter)
    pub total: usize,
    /// Companies resolved by the direct PDF search
    pub direct_success: usize,
    /// Companies resolved by the webpage fallback
    pub webpage_success: usize,
    /// Companies for which every stage failed
    pub failed_companies: BTreeSet<CompanyName>,
}

impl RunStats {
    /// Empty statistics for a run dispatching `total` companies.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Fold one finished task into the counters.
    ///
    /// A task still pending when reported is counted as failed.
    pub fn record(&mut self, task: CompanyTask) {
        match task.status() {
            TaskStatus::ResolvedDirect => self.direct_success += 1,
            TaskStatus::ResolvedWebpage => self.webpage_success += 1,
            status => {
                if status == TaskStatus::Pending {
                    tracing::warn!(company = %task.company_name(), "task reported while pending");
                }
                if !self.failed_companies.insert(task.into_company_name()) {
                    tracing::warn!("Company reported as failed twice in one run");
                }
            }
        }
    }

    /// Number of outcomes recorded so far.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.direct_success + self.webpage_success + self.failed_companies.len()
    }

    /// Whether every dispatched company has exactly one recorded outcome.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.processed() == self.total
    }
}

/// Outcome of one resolution task.
#[derive(Debug, Clone)]
pub struct TaskReport {
    /// The task in its final state
    pub task: CompanyTask,
}

/// Spawn the aggregator for a run of `total` companies.
///
/// The aggregator finishes once every sender has been dropped and yields the
/// final statistics.
#[must_use]
pub fn spawn_aggregator(total: usize) -> (mpsc::Sender<TaskReport>, JoinHandle<RunStats>) {
    let (tx, mut rx) = mpsc::channel::<TaskReport>(total.max(1));

    let handle = tokio::spawn(async move {
        let mut stats = RunStats::new(total);
        while let Some(report) = rx.recv().await {
            tracing::debug!(
                company = %report.task.company_name(),
                status = %report.task.status(),
                "task finished"
            );
            stats.record(report.task);
        }
        stats
    });

    (tx, handle)
}
