//! Batch summary and missing-report ledger files.

use crate::audit::{append_to, DELIMITER};
use crate::error::Result;
use crate::stats::RunStats;
use esg_core::CompanyName;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Log file of a scheduled batch: `<log_dir>/crawler_batch<N>_log.txt`.
#[must_use]
pub fn batch_log_path(log_dir: &Path, batch_num: usize) -> PathBuf {
    log_dir.join(format!("crawler_batch{batch_num}_log.txt"))
}

/// Summary file of a scheduled batch: `<log_dir>/crawler_batch<N>_summary.txt`.
#[must_use]
pub fn batch_summary_path(log_dir: &Path, batch_num: usize) -> PathBuf {
    log_dir.join(format!("crawler_batch{batch_num}_summary.txt"))
}

/// Log file of a missing-report backfill run.
#[must_use]
pub fn backfill_log_path(log_dir: &Path) -> PathBuf {
    log_dir.join("crawler_missing_reports_log.txt")
}

/// Summary file of a missing-report backfill run.
#[must_use]
pub fn backfill_summary_path(log_dir: &Path) -> PathBuf {
    log_dir.join("crawler_missing_reports_summary.txt")
}

/// Render one summary record.
#[must_use]
pub fn format_summary(title: &str, stats: &RunStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{DELIMITER}");
    let _ = writeln!(out, "Crawler Summary Report - {title}");
    let _ = writeln!(out, "Total Companies: {}", stats.total);
    let _ = writeln!(out, "Direct PDF Search Success: {}", stats.direct_success);
    let _ = writeln!(out, "Webpage PDF Search Success: {}", stats.webpage_success);
    let _ = writeln!(out, "Failed Companies: {}", stats.failed_companies.len());
    let _ = writeln!(out, "\nList of Failed Companies:");
    for company in &stats.failed_companies {
        let _ = writeln!(out, "- {company}");
    }
    let _ = writeln!(out, "\n{DELIMITER}");
    out
}

/// Append one summary record to `path`.
pub async fn append_summary(path: &Path, title: &str, stats: &RunStats) -> Result<()> {
    append_to(path, &format_summary(title, stats)).await?;
    Ok(())
}

/// Render the missing-report ledger entry.
#[must_use]
pub fn format_missing_ledger(companies: &[CompanyName]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{DELIMITER}");
    let _ = writeln!(out, "Total missing reports: {}", companies.len());
    for company in companies {
        let _ = writeln!(out, "{company}");
    }
    out
}

/// Append the missing-report ledger entry to `path`.
pub async fn append_missing_ledger(path: &Path, companies: &[CompanyName]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    append_to(path, &format_missing_ledger(companies)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Resolution;

    fn company(name: &str) -> CompanyName {
        CompanyName::new(name).expect("valid company name")
    }

    fn settled(name: &str, resolution: Resolution) -> esg_core::CompanyTask {
        let mut task = esg_core::CompanyTask::new(company(name));
        resolution.settle(&mut task);
        task
    }

    #[test]
    fn test_paths() {
        let dir = Path::new("/var/logs");
        assert_eq!(
            batch_log_path(dir, 3),
            PathBuf::from("/var/logs/crawler_batch3_log.txt")
        );
        assert_eq!(
            batch_summary_path(dir, 3),
            PathBuf::from("/var/logs/crawler_batch3_summary.txt")
        );
        assert_eq!(
            backfill_summary_path(dir),
            PathBuf::from("/var/logs/crawler_missing_reports_summary.txt")
        );
    }

    #[test]
    fn test_format_summary() {
        let mut stats = RunStats::new(3);
        stats.record(settled("Acme Corp", Resolution::Direct(PathBuf::from("a.pdf"))));
        stats.record(settled("NoReport Inc", Resolution::Failed));
        stats.record(settled("Beta AG", Resolution::Failed));

        let summary = format_summary("Batch 2", &stats);
        let expected = format!(
            "{DELIMITER}\n\
             Crawler Summary Report - Batch 2\n\
             Total Companies: 3\n\
             Direct PDF Search Success: 1\n\
             Webpage PDF Search Success: 0\n\
             Failed Companies: 2\n\
             \n\
             List of Failed Companies:\n\
             - Beta AG\n\
             - NoReport Inc\n\
             \n\
             {DELIMITER}\n"
        );
        assert_eq!(summary, expected);
    }

    #[tokio::test]
    async fn test_summaries_append() {
        let tmp = tempfile::TempDir::new().expect("create temp dir");
        let path = batch_summary_path(tmp.path(), 1);

        append_summary(&path, "Batch 1", &RunStats::new(0))
            .await
            .expect("first summary");
        append_summary(&path, "Batch 1", &RunStats::new(0))
            .await
            .expect("second summary");

        let contents = std::fs::read_to_string(&path).expect("read summary");
        assert_eq!(contents.matches("Crawler Summary Report - Batch 1").count(), 2);
    }

    #[tokio::test]
    async fn test_missing_ledger() {
        let tmp = tempfile::TempDir::new().expect("create temp dir");
        let path = tmp.path().join("reports/_missing_reports.txt");

        append_missing_ledger(&path, &[company("Acme Corp"), company("Beta AG")])
            .await
            .expect("write ledger");

        let contents = std::fs::read_to_string(&path).expect("read ledger");
        assert_eq!(
            contents,
            format!("{DELIMITER}\nTotal missing reports: 2\nAcme Corp\nBeta AG\n")
        );
    }
}
