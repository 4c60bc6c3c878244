//! # INEO Labeling Job
//!
//! Fetches the provider mapping, labels every matching index record, and prints a run
//! summary. Exits with status 1 on configuration, mapping, or fetch failures; record
//! level failures are reported but do not change the exit status.

use anyhow::Context;
use clap::Parser;
use ineo_labeling::{
    logging, LabelingConfig, LabelingOrchestrator, MappingFetcher, RunSummary, SolrClient,
};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "ineo-labeling")]
#[command(about = "Label search index records using a provider mapping document")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Optional TOML config file; environment variables override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Index query selecting the records to label
    #[arg(short, long)]
    query: Option<String>,

    /// Name of the boolean field to set on each record
    #[arg(long)]
    flag_field: Option<String>,

    /// Maximum number of concurrent index requests
    #[arg(short, long)]
    workers: Option<usize>,

    /// Resolve and report without writing to the index
    #[arg(long)]
    dry_run: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    logging::init_console_logging();

    match run(&cli) {
        Ok(summary) => {
            if summary.has_record_failures() {
                info!("Labeling finished with record-level failures, see summary");
            }
            process::exit(0);
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "Labeling run failed");
            eprintln!("ineo-labeling: {e:#}");
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<RunSummary> {
    let mut config = LabelingConfig::load(cli.config.as_deref())?;
    apply_cli_overrides(&mut config, cli);
    config.validate()?;

    let index = Arc::new(SolrClient::new(&config.index)?);
    let mapping = Arc::new(MappingFetcher::new(
        &config.mapping_url,
        config.index.request_timeout(),
    )?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let orchestrator = LabelingOrchestrator::new(config, index, mapping);
    let summary = runtime.block_on(orchestrator.run())?;

    print_summary(&summary, cli.json)?;
    Ok(summary)
}

fn apply_cli_overrides(config: &mut LabelingConfig, cli: &Cli) {
    if let Some(query) = &cli.query {
        config.index.query = query.clone();
    }
    if let Some(flag_field) = &cli.flag_field {
        config.index.flag_field = flag_field.clone();
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if cli.dry_run {
        config.dry_run = true;
    }
}

fn print_summary(summary: &RunSummary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("Run {}{}", summary.run_id, if summary.dry_run { " (dry run)" } else { "" });
    println!("  records seen:        {}", summary.records_seen);
    println!("  labeled true:        {}", summary.labeled_true);
    println!("  labeled false:       {}", summary.labeled_false);
    println!("  resolution failures: {}", summary.resolution_failures.len());
    println!("  updates succeeded:   {}", summary.updates_succeeded);
    println!("  update failures:     {}", summary.update_failures.len());

    for failure in &summary.resolution_failures {
        println!("  ! unresolved {}: {}", failure.id, failure.cause);
    }
    for failure in &summary.update_failures {
        println!("  ! not updated {}: {}", failure.id, failure.cause);
    }
    Ok(())
}
