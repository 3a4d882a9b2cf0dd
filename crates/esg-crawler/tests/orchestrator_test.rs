mod common;

use common::{company, FakeResolver, Outcome};
use esg_core::{BatchConfig, PathsConfig};
use esg_crawler::{BatchOrchestrator, CrawlError};
use esg_registry::StaticRegistry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const TABLE: &str = "emissions_data";

fn paths(tmp: &TempDir) -> PathsConfig {
    PathsConfig {
        output_dir: tmp.path().join("reports"),
        log_dir: tmp.path().join("logs"),
        database_path: tmp.path().join("companies.db"),
    }
}

fn orchestrator(tmp: &TempDir, names: &[&str], resolver: Arc<FakeResolver>) -> BatchOrchestrator {
    let registry = StaticRegistry::new(names.iter().map(|name| company(name)).collect());
    BatchOrchestrator::new(
        Arc::new(registry),
        resolver,
        paths(tmp),
        BatchConfig::default(),
    )
}

#[tokio::test]
async fn test_batch_aggregates_outcomes_and_writes_reports() {
    let tmp = TempDir::new().expect("create temp dir");
    let resolver = Arc::new(FakeResolver::new(
        &paths(&tmp).output_dir,
        &[
            ("Acme Corp", Outcome::Direct),
            ("Beta AG", Outcome::Webpage),
            ("NoReport Inc", Outcome::Fail),
        ],
    ));
    let orchestrator = orchestrator(&tmp, &["Acme Corp", "Beta AG", "NoReport Inc"], resolver);

    let stats = orchestrator.run_batch(TABLE, 1, 1).await.expect("run batch");

    assert_eq!(stats.total, 3);
    assert_eq!(stats.direct_success, 1);
    assert_eq!(stats.webpage_success, 1);
    assert_eq!(stats.failed_companies.len(), 1);
    assert!(stats.failed_companies.contains(&company("NoReport Inc")));
    assert!(stats.is_complete());

    let summary = std::fs::read_to_string(tmp.path().join("logs/crawler_batch1_summary.txt"))
        .expect("read summary");
    assert!(summary.contains("Crawler Summary Report - Batch 1"));
    assert!(summary.contains("Total Companies: 3"));
    assert_eq!(summary.matches("- NoReport Inc").count(), 1);

    let log = std::fs::read_to_string(tmp.path().join("logs/crawler_batch1_log.txt"))
        .expect("read log");
    let start = log.find("Start Time").expect("start delimiter");
    let end = log.find("End Time").expect("end delimiter");
    assert!(start < end);
}

#[tokio::test]
async fn test_batch_resolves_only_its_partition() {
    let tmp = TempDir::new().expect("create temp dir");
    let names = ["A", "B", "C", "D", "E"];
    let resolver = Arc::new(FakeResolver::new(&paths(&tmp).output_dir, &[]));
    let orchestrator = orchestrator(&tmp, &names, resolver.clone());

    let stats = orchestrator.run_batch(TABLE, 2, 2).await.expect("run batch");

    assert_eq!(stats.total, 2);
    assert_eq!(resolver.calls(), vec!["B", "D"]);
}

#[tokio::test]
async fn test_existing_artifacts_are_not_resolved_again() {
    let tmp = TempDir::new().expect("create temp dir");
    let output_dir = paths(&tmp).output_dir;
    std::fs::create_dir_all(&output_dir).expect("create output dir");
    std::fs::write(output_dir.join("Acme_Corp-a73cb456.pdf"), b"%PDF-1.4").expect("seed artifact");

    let resolver = Arc::new(FakeResolver::new(
        &output_dir,
        &[("Beta AG", Outcome::Direct), ("NoReport Inc", Outcome::Fail)],
    ));
    let orchestrator = orchestrator(
        &tmp,
        &["Acme Corp", "Beta AG", "NoReport Inc"],
        resolver.clone(),
    );

    let first = orchestrator.run_batch(TABLE, 1, 1).await.expect("first run");
    assert_eq!(first.total, 2);
    assert_eq!(resolver.calls(), vec!["Beta AG", "NoReport Inc"]);

    // Rerunning only retries the company that still has no artifact
    let second = orchestrator.run_batch(TABLE, 1, 1).await.expect("second run");
    assert_eq!(second.total, 1);
    assert_eq!(second.failed_companies.len(), 1);
    assert_eq!(
        resolver.calls(),
        vec!["Beta AG", "NoReport Inc", "NoReport Inc"]
    );
}

#[tokio::test]
async fn test_panicking_task_is_counted_as_failed() {
    let tmp = TempDir::new().expect("create temp dir");
    let resolver = Arc::new(FakeResolver::new(
        &paths(&tmp).output_dir,
        &[
            ("Acme Corp", Outcome::Direct),
            ("Crash Co", Outcome::Panic),
            ("Beta AG", Outcome::Direct),
        ],
    ));
    let orchestrator = orchestrator(&tmp, &["Acme Corp", "Crash Co", "Beta AG"], resolver);

    let stats = orchestrator.run_batch(TABLE, 1, 1).await.expect("run batch");

    assert_eq!(stats.direct_success, 2);
    assert!(stats.failed_companies.contains(&company("Crash Co")));
    assert!(stats.is_complete());

    let log = std::fs::read_to_string(tmp.path().join("logs/crawler_batch1_log.txt"))
        .expect("read log");
    assert!(log.contains("Crash Co: Resolution aborted"));
}

#[tokio::test]
async fn test_worker_pool_bounds_concurrency() {
    let tmp = TempDir::new().expect("create temp dir");
    let names: Vec<String> = (0..12).map(|i| format!("Company {i}")).collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let resolver = Arc::new(
        FakeResolver::new(&paths(&tmp).output_dir, &[]).with_delay(Duration::from_millis(20)),
    );
    let orchestrator = orchestrator(&tmp, &name_refs, resolver.clone());

    let stats = orchestrator.run_batch(TABLE, 1, 1).await.expect("run batch");

    assert_eq!(stats.processed(), 12);
    let peak = resolver.max_in_flight.load(Ordering::SeqCst);
    assert!(peak >= 1 && peak <= BatchConfig::default().workers);
}

#[tokio::test]
async fn test_invalid_batch_number_is_rejected() {
    let tmp = TempDir::new().expect("create temp dir");
    let resolver = Arc::new(FakeResolver::new(&paths(&tmp).output_dir, &[]));
    let orchestrator = orchestrator(&tmp, &["Acme Corp"], resolver.clone());

    let err = orchestrator.run_batch(TABLE, 10, 11).await.unwrap_err();
    assert!(matches!(
        err,
        CrawlError::InvalidBatch {
            batch_num: 11,
            total_batches: 10
        }
    ));
    assert!(resolver.calls().is_empty());
}

#[tokio::test]
async fn test_rounds_run_every_batch_each_round() {
    let tmp = TempDir::new().expect("create temp dir");
    let resolver = Arc::new(FakeResolver::new(
        &paths(&tmp).output_dir,
        &[("Acme Corp", Outcome::Direct)],
    ));
    let orchestrator = orchestrator(&tmp, &["Acme Corp", "NoReport Inc"], resolver.clone());

    let all = orchestrator.run_rounds(TABLE, 2, 2).await;

    assert_eq!(all.len(), 4);
    // Acme resolves once; NoReport is retried every round
    assert_eq!(
        resolver.calls(),
        vec!["Acme Corp", "NoReport Inc", "NoReport Inc"]
    );

    let summary = std::fs::read_to_string(tmp.path().join("logs/crawler_batch2_summary.txt"))
        .expect("read summary");
    assert_eq!(summary.matches("Crawler Summary Report - Batch 2").count(), 2);
}

#[tokio::test]
async fn test_backfill_writes_missing_ledger() {
    let tmp = TempDir::new().expect("create temp dir");
    let output_dir = paths(&tmp).output_dir;
    std::fs::create_dir_all(&output_dir).expect("create output dir");
    std::fs::write(output_dir.join("Acme_Corp-a73cb456.pdf"), b"%PDF-1.4").expect("seed artifact");

    let resolver = Arc::new(FakeResolver::new(
        &output_dir,
        &[("Beta AG", Outcome::Webpage)],
    ));
    let orchestrator = orchestrator(
        &tmp,
        &["Acme Corp", "Beta AG", "NoReport Inc"],
        resolver.clone(),
    );

    let stats = orchestrator.run_backfill(TABLE).await.expect("run backfill");

    assert_eq!(stats.total, 2);
    assert_eq!(stats.webpage_success, 1);

    let ledger = std::fs::read_to_string(output_dir.join("_missing_reports.txt"))
        .expect("read ledger");
    assert!(ledger.contains("Total missing reports: 2"));
    assert!(ledger.contains("Beta AG"));
    assert!(!ledger.contains("Acme Corp"));

    let summary = std::fs::read_to_string(
        tmp.path().join("logs/crawler_missing_reports_summary.txt"),
    )
    .expect("read summary");
    assert!(summary.contains("Crawler Summary Report - Missing Reports"));
}

#[tokio::test]
async fn test_empty_batch_completes_with_zero_totals() {
    let tmp = TempDir::new().expect("create temp dir");
    let resolver = Arc::new(FakeResolver::new(&paths(&tmp).output_dir, &[]));
    let orchestrator = orchestrator(&tmp, &[], resolver);

    let stats = orchestrator.run_batch(TABLE, 1, 1).await.expect("run batch");

    assert_eq!(stats.total, 0);
    assert_eq!(stats.processed(), 0);
}
