//! End-to-end run: listing, matching, processing, and report assembly.

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::extraction::TextConverter;
use crate::matcher::{index_listing, match_jobs};
use crate::payload::current_timestamp_rfc3339;
use crate::pipeline::{Job, Pipeline, PipelineOptions};
use crate::report::RunReport;
use crate::storage::{ObjectStore, StorageError};
use crate::submission::Vectorizer;

/// Collaborators and settings for one run.
pub struct Migration<'a> {
    /// Read-only catalog.
    pub catalog: &'a Catalog,
    /// Storage namespace to list and download from.
    pub storage: &'a dyn ObjectStore,
    /// Submission destination.
    pub vectorizer: &'a dyn Vectorizer,
    /// PDF-to-text converter.
    pub converter: Arc<dyn TextConverter>,
    /// Loop tunables.
    pub options: PipelineOptions,
    /// Process at most this many matched jobs.
    pub limit: Option<usize>,
    /// Stop after matching, without downloading or submitting.
    pub dry_run: bool,
}

/// How a run ended.
#[derive(Debug)]
pub enum MigrationOutcome {
    /// No target was found in storage; nothing was attempted.
    NothingToProcess {
        /// Targets absent from storage.
        missing: usize,
    },
    /// Dry run: the jobs that would have been processed.
    Planned(Vec<Job>),
    /// All jobs were processed.
    Completed(RunReport),
}

impl Migration<'_> {
    /// Execute the run. Only a failed storage listing is fatal.
    pub async fn run(self, targets: &[String]) -> Result<MigrationOutcome, StorageError> {
        let listing = index_listing(self.storage.list_objects().await?);
        let matched = match_jobs(targets, &listing);

        let mut jobs = matched.jobs;
        if jobs.is_empty() {
            tracing::warn!(
                targets = targets.len(),
                "No target documents found in storage; nothing to process"
            );
            return Ok(MigrationOutcome::NothingToProcess {
                missing: matched.missing.len(),
            });
        }

        if let Some(limit) = self.limit
            && jobs.len() > limit
        {
            tracing::info!(limit, matched = jobs.len(), "Limiting job list");
            jobs.truncate(limit);
        }

        if self.dry_run {
            for job in &jobs {
                tracing::info!(
                    id = %job.object.id,
                    file = %job.object.name,
                    in_catalog = self.catalog.lookup(&job.object.name).is_some(),
                    "Planned job"
                );
            }
            return Ok(MigrationOutcome::Planned(jobs));
        }

        let pipeline = Pipeline::new(
            self.catalog,
            self.storage,
            self.vectorizer,
            self.converter,
            self.options,
        );
        let run = pipeline.run(&jobs).await;
        let report = run
            .statistics
            .into_report(jobs.len(), run.results, current_timestamp_rfc3339());
        Ok(MigrationOutcome::Completed(report))
    }
}
