use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use iadb_vectorizer::{
    catalog::Catalog,
    config, logging,
    extraction::CommandConverter,
    migration::{Migration, MigrationOutcome},
    pipeline::PipelineOptions,
    report,
    storage::StorageService,
    submission::VectorizeService,
    targets,
};

#[derive(Parser)]
#[command(
    name = "iadb-vectorizer",
    about = "Submit stored IADB PDF documents to the vectorization service"
)]
struct Cli {
    /// File with the storage object ids to process (JSON array or one id per line).
    #[arg(long)]
    targets: PathBuf,
    /// JSON catalog with document titles and source URLs.
    #[arg(long)]
    catalog: PathBuf,
    /// Where to write the run report.
    #[arg(long, default_value = "vectorization-report.json")]
    report: PathBuf,
    /// Process at most this many matched documents.
    #[arg(long)]
    limit: Option<usize>,
    /// Match targets and list the plan without submitting anything.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    let run_log = logging::init_tracing();
    if let Some(path) = &run_log {
        tracing::info!(log = %path.display(), "Writing run log");
    }
    if let Err(err) = run(Cli::parse()).await {
        tracing::error!(error = %format!("{err:#}"), "Migration aborted");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::init_config().context("configuration is incomplete")?;
    let catalog = Catalog::load(&cli.catalog)?;
    let targets = targets::load_targets(&cli.targets)?;

    let storage = StorageService::new(config).context("failed to initialize storage client")?;
    let vectorizer =
        VectorizeService::new(config).context("failed to initialize vectorization client")?;
    let converter = CommandConverter::new(config.converter_bin.clone())
        .with_temp_dir(config.extraction_temp_dir.clone());

    let migration = Migration {
        catalog: &catalog,
        storage: &storage,
        vectorizer: &vectorizer,
        converter: Arc::new(converter),
        options: PipelineOptions {
            delay: config.request_delay(),
            ..PipelineOptions::default()
        },
        limit: cli.limit,
        dry_run: cli.dry_run,
    };

    match migration
        .run(&targets)
        .await
        .context("failed to list storage objects")?
    {
        MigrationOutcome::NothingToProcess { missing } => {
            tracing::info!(missing, "No documents to process");
        }
        MigrationOutcome::Planned(jobs) => {
            tracing::info!(jobs = jobs.len(), "Dry run complete; nothing submitted");
        }
        MigrationOutcome::Completed(run_report) => {
            report::write_report(&cli.report, &run_report)?;
            report::log_summary(&run_report);
            println!("{}", cli.report.display());
        }
    }
    Ok(())
}
