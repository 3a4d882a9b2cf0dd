//! Batch orchestrator for resolving large company lists.
//!
//! This module provides the `BatchOrchestrator` which partitions the company
//! list, skips companies that already have an artifact, dispatches the rest
//! across a fixed-size worker pool, and writes the batch log and summary.

use crate::audit::AuditLog;
use crate::context::RunContext;
use crate::error::{CrawlError, Result};
use crate::report;
use crate::resolver::{CompanyResolver, Resolution};
use crate::stats::{spawn_aggregator, RunStats, TaskReport};
use esg_core::{BatchConfig, CompanyName, CompanyTask, PathsConfig};
use esg_registry::CompanyRegistry;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::Instrument;

/// Select batch `batch_num` (one-based) of `total_batches`.
///
/// Item `i` belongs to batch `i % total_batches + 1`, so batches are disjoint,
/// cover the input exactly, and keep input order.
pub fn partition<T: Clone>(items: &[T], total_batches: usize, batch_num: usize) -> Result<Vec<T>> {
    if total_batches == 0 || batch_num == 0 || batch_num > total_batches {
        return Err(CrawlError::InvalidBatch {
            batch_num,
            total_batches,
        });
    }

    Ok(items
        .iter()
        .enumerate()
        .filter(|(i, _)| i % total_batches == batch_num - 1)
        .map(|(_, item)| item.clone())
        .collect())
}

/// Drop companies whose artifact already exists on disk.
///
/// An existing `<output_dir>/<sanitized name>.pdf` counts as a prior success
/// and is not re-validated.
pub async fn filter_resumable(companies: Vec<CompanyName>, paths: &PathsConfig) -> Vec<CompanyName> {
    let mut pending = Vec::with_capacity(companies.len());
    for company in companies {
        let artifact = paths.artifact_path(&company);
        match tokio::fs::try_exists(&artifact).await {
            Ok(true) => tracing::debug!(company = %company, "artifact exists, skipping"),
            Ok(false) => pending.push(company),
            Err(e) => {
                tracing::warn!("Cannot check {}: {}", artifact.display(), e);
                pending.push(company);
            }
        }
    }
    pending
}

/// Orchestrates resolution runs over the company registry.
pub struct BatchOrchestrator {
    /// Source of the company list
    registry: Arc<dyn CompanyRegistry>,
    /// Per-company resolver
    resolver: Arc<dyn CompanyResolver>,
    /// Artifact and log locations
    paths: PathsConfig,
    /// Worker pool sizes
    batch: BatchConfig,
}

impl BatchOrchestrator {
    /// Create a new batch orchestrator.
    #[must_use]
    pub fn new(
        registry: Arc<dyn CompanyRegistry>,
        resolver: Arc<dyn CompanyResolver>,
        paths: PathsConfig,
        batch: BatchConfig,
    ) -> Self {
        Self {
            registry,
            resolver,
            paths,
            batch,
        }
    }

    /// Repeat the full batch sequence `attempt_rounds` times.
    ///
    /// A batch that fails to start (registry or filesystem error) is logged
    /// and the sequence continues. Returns the statistics of every batch
    /// that ran, in execution order.
    pub async fn run_rounds(
        &self,
        table: &str,
        total_batches: usize,
        attempt_rounds: usize,
    ) -> Vec<RunStats> {
        let mut completed = Vec::new();

        for round in 1..=attempt_rounds {
            tracing::info!("Starting round {}/{}", round, attempt_rounds);
            for batch_num in 1..=total_batches {
                match self.run_batch(table, total_batches, batch_num).await {
                    Ok(stats) => completed.push(stats),
                    Err(e) => {
                        tracing::error!(round, batch_num, "Batch failed to run: {}", e);
                    }
                }
            }
        }

        completed
    }

    /// Resolve one batch of the registry table.
    pub async fn run_batch(
        &self,
        table: &str,
        total_batches: usize,
        batch_num: usize,
    ) -> Result<RunStats> {
        let companies = self.registry.list_companies(table).await?;
        let batch = partition(&companies, total_batches, batch_num)?;
        let pending = filter_resumable(batch, &self.paths).await;

        let audit = AuditLog::open(report::batch_log_path(&self.paths.log_dir, batch_num)).await?;
        let ctx = Arc::new(RunContext::new(format!("Batch {batch_num}"), audit));

        let span = tracing::info_span!("batch", batch_num, run_id = %ctx.run_id());
        async {
            tracing::info!(
                "Starting batch {}/{} with {} companies",
                batch_num,
                total_batches,
                pending.len()
            );
            self.run(
                ctx.clone(),
                pending,
                self.batch.workers,
                report::batch_summary_path(&self.paths.log_dir, batch_num),
            )
            .await
        }
        .instrument(span)
        .await
    }

    /// Resolve every registry company lacking an artifact, after recording
    /// them in the missing-report ledger.
    pub async fn run_backfill(&self, table: &str) -> Result<RunStats> {
        let companies = self.registry.list_companies(table).await?;
        let pending = filter_resumable(companies, &self.paths).await;

        report::append_missing_ledger(&self.paths.missing_reports_path(), &pending).await?;

        let audit = AuditLog::open(report::backfill_log_path(&self.paths.log_dir)).await?;
        let ctx = Arc::new(RunContext::new("Missing Reports", audit));

        let span = tracing::info_span!("backfill", run_id = %ctx.run_id());
        async {
            tracing::info!("Starting backfill of {} companies", pending.len());
            self.run(
                ctx.clone(),
                pending,
                self.batch.backfill_workers,
                report::backfill_summary_path(&self.paths.log_dir),
            )
            .await
        }
        .instrument(span)
        .await
    }

    /// Bracket the log, dispatch, and append the summary.
    async fn run(
        &self,
        ctx: Arc<RunContext>,
        companies: Vec<CompanyName>,
        workers: usize,
        summary_path: PathBuf,
    ) -> Result<RunStats> {
        tokio::fs::create_dir_all(&self.paths.output_dir).await?;

        ctx.audit().delimit("Start Time").await;
        let stats = dispatch(self.resolver.clone(), ctx.clone(), companies, workers).await?;
        report::append_summary(&summary_path, ctx.label(), &stats).await?;
        ctx.audit().delimit("End Time").await;

        tracing::info!(
            total = stats.total,
            direct = stats.direct_success,
            webpage = stats.webpage_success,
            failed = stats.failed_companies.len(),
            "{} completed",
            ctx.label()
        );
        Ok(stats)
    }
}

/// Resolve `companies` on a pool of `workers` tasks and aggregate the outcomes.
///
/// Returns once every company has been processed. A task that panics is
/// recorded as failed without affecting its siblings.
pub async fn dispatch(
    resolver: Arc<dyn CompanyResolver>,
    ctx: Arc<RunContext>,
    companies: Vec<CompanyName>,
    workers: usize,
) -> Result<RunStats> {
    let total = companies.len();
    let queue: VecDeque<CompanyTask> = companies.into_iter().map(CompanyTask::new).collect();
    let queue = Arc::new(Mutex::new(queue));
    let (tx, aggregator) = spawn_aggregator(total);

    let mut pool = JoinSet::new();
    for worker_id in 0..workers.max(1).min(total) {
        let queue = queue.clone();
        let tx = tx.clone();
        let resolver = resolver.clone();
        let ctx = ctx.clone();

        pool.spawn(async move {
            loop {
                let next = queue.lock().await.pop_front();
                let Some(mut task) = next else { break };

                let company = task.company_name().clone();
                tracing::debug!(worker_id, company = %company, "processing");
                resolve_isolated(resolver.clone(), ctx.clone(), company)
                    .await
                    .settle(&mut task);
                if tx.send(TaskReport { task }).await.is_err() {
                    tracing::error!(worker_id, "statistics aggregator is gone");
                    break;
                }
            }
        });
    }
    drop(tx);

    while let Some(joined) = pool.join_next().await {
        if let Err(e) = joined {
            tracing::error!("Worker terminated abnormally: {}", e);
        }
    }

    aggregator
        .await
        .map_err(|e| CrawlError::Aggregator(e.to_string()))
}

/// Run one resolution on its own task so a panic only fails that company.
async fn resolve_isolated(
    resolver: Arc<dyn CompanyResolver>,
    ctx: Arc<RunContext>,
    company: CompanyName,
) -> Resolution {
    let task_company = company.clone();
    let task_ctx = ctx.clone();
    let handle = tokio::spawn(async move { resolver.resolve(&task_ctx, &task_company).await });

    match handle.await {
        Ok(resolution) => resolution,
        Err(e) => {
            ctx.audit()
                .record(&company, format!("Resolution aborted: {e}"))
                .await;
            Resolution::Failed
        }
    }
}
