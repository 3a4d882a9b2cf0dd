use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use esg_browser::ChromeLauncher;
use esg_core::{AppConfig, CompanyName, CompanyTask};
use esg_crawler::{
    AuditLog, BatchOrchestrator, CompanyResolver, PdfTextExtractor, PdfValidator, Resolver,
    RetryPolicy, RunContext,
};
use esg_registry::SqliteRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "esg-harvester")]
#[command(version, about = "Sustainability report harvester")]
struct Cli {
    /// Configuration file (defaults to the per-user config path)
    #[arg(long, global = true, env = "ESG_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every batch of the registry, repeated over several rounds
    Run {
        /// Registry table holding the company list
        #[arg(long)]
        table_name: Option<String>,

        /// Number of partitions of the company list
        #[arg(long)]
        total_batches: Option<usize>,

        /// Number of times the full batch sequence is repeated
        #[arg(long)]
        attempt_rounds: Option<usize>,
    },
    /// Run a single batch
    Batch {
        /// One-based batch number
        batch_num: usize,

        #[arg(long)]
        table_name: Option<String>,

        #[arg(long)]
        total_batches: Option<usize>,
    },
    /// Resolve every registry company that has no report yet
    Backfill {
        #[arg(long)]
        table_name: Option<String>,
    },
    /// Resolve one company outside the registry
    Resolve {
        /// Company name as it should be searched
        company: String,
    },
}

/// Initialize tracing subscriber for logging
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,esg=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => {
            let mut config = AppConfig::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.apply_env_overrides();
            config.validate()?;
            config
        }
        None => AppConfig::load_with_env().context("Failed to load config")?,
    };
    Ok(config)
}

fn build_resolver(config: &AppConfig) -> Result<Resolver> {
    let retry = RetryPolicy::from_config(&config.retry);
    let validator = PdfValidator::new(
        &config.http,
        config.paths.output_dir.clone(),
        retry,
        Arc::new(PdfTextExtractor),
    )
    .context("Failed to build HTTP client")?;

    Ok(Resolver::new(
        Arc::new(ChromeLauncher::new(config.browser.clone())),
        Arc::new(validator),
        config.search.clone(),
        retry,
        config.browser.wait_timeout(),
    ))
}

async fn build_orchestrator(config: &AppConfig) -> Result<BatchOrchestrator> {
    let registry = SqliteRegistry::open(&config.paths.database_path)
        .await
        .with_context(|| {
            format!(
                "Failed to open registry {}",
                config.paths.database_path.display()
            )
        })?;

    Ok(BatchOrchestrator::new(
        Arc::new(registry),
        Arc::new(build_resolver(config)?),
        config.paths.clone(),
        config.batch.clone(),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    info!("Starting ESG harvester v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Run {
            table_name,
            total_batches,
            attempt_rounds,
        } => {
            let table = table_name.unwrap_or_else(|| config.batch.table_name.clone());
            let total_batches = total_batches.unwrap_or(config.batch.total_batches);
            let attempt_rounds = attempt_rounds.unwrap_or(config.batch.attempt_rounds);

            let orchestrator = build_orchestrator(&config).await?;
            let completed = orchestrator
                .run_rounds(&table, total_batches, attempt_rounds)
                .await;
            info!(
                "Finished {} of {} batch runs",
                completed.len(),
                total_batches * attempt_rounds
            );
        }
        Commands::Batch {
            batch_num,
            table_name,
            total_batches,
        } => {
            let table = table_name.unwrap_or_else(|| config.batch.table_name.clone());
            let total_batches = total_batches.unwrap_or(config.batch.total_batches);

            let orchestrator = build_orchestrator(&config).await?;
            let stats = orchestrator
                .run_batch(&table, total_batches, batch_num)
                .await
                .with_context(|| format!("Batch {batch_num} failed"))?;
            info!(
                "Batch {} resolved {} of {} companies",
                batch_num,
                stats.direct_success + stats.webpage_success,
                stats.total
            );
        }
        Commands::Backfill { table_name } => {
            let table = table_name.unwrap_or_else(|| config.batch.table_name.clone());

            let orchestrator = build_orchestrator(&config).await?;
            let stats = orchestrator
                .run_backfill(&table)
                .await
                .context("Backfill failed")?;
            info!(
                "Backfill resolved {} of {} companies",
                stats.direct_success + stats.webpage_success,
                stats.total
            );
        }
        Commands::Resolve { company } => {
            let company = CompanyName::new(company)?;
            tokio::fs::create_dir_all(&config.paths.output_dir).await?;

            let audit = AuditLog::open(config.paths.log_dir.join("crawler_resolve_log.txt")).await?;
            let ctx = RunContext::new(company.as_str(), audit);
            let mut task = CompanyTask::new(company.clone());
            build_resolver(&config)?
                .resolve(&ctx, &company)
                .await
                .settle(&mut task);

            match task.artifact_path() {
                Some(path) if task.status().is_resolved() => {
                    println!("{} ({})", path.display(), task.status());
                }
                _ => println!("No report found for {company}"),
            }
        }
    }

    Ok(())
}
