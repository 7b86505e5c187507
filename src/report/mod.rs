//! Run report aggregation and persistence.

pub mod statistics;
pub mod types;

pub use statistics::{ExtractionTally, RunStatistics, percentage};
pub use types::{ItemResult, RunReport, RunSummary, TextExtractionSummary};

use std::path::Path;
use thiserror::Error;

/// Failures while persisting the report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Report could not be serialized.
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Report file could not be written.
    #[error("Failed to write report to {path}: {source}")]
    Io {
        /// Destination path.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

const ERROR_SAMPLE_SIZE: usize = 5;

/// First failures of a run plus how many were left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSample<'a> {
    /// Up to five failed results, in job order.
    pub items: Vec<&'a ItemResult>,
    /// Failures beyond the sample.
    pub remaining: usize,
}

/// Select the first failures for display.
pub fn error_sample(results: &[ItemResult]) -> ErrorSample<'_> {
    let failures: Vec<&ItemResult> = results.iter().filter(|result| !result.success).collect();
    let remaining = failures.len().saturating_sub(ERROR_SAMPLE_SIZE);
    ErrorSample {
        items: failures.into_iter().take(ERROR_SAMPLE_SIZE).collect(),
        remaining,
    }
}

/// Serialize the report as pretty-printed JSON in a single write.
pub fn write_report(path: &Path, report: &RunReport) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(report)?;
    let io_error = |source| ReportError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, json).map_err(io_error)?;
    tracing::info!(path = %path.display(), results = report.results.len(), "Report written");
    Ok(())
}

/// Log the final summary and the error sample.
pub fn log_summary(report: &RunReport) {
    let summary = &report.summary;
    let extraction = &report.text_extraction;
    tracing::info!(
        total = summary.total_files,
        processed = summary.processed,
        successful = summary.successful,
        errors = summary.errors,
        skipped = summary.skipped,
        chunks_created = summary.chunks_created,
        success_rate = summary.success_rate,
        "Run finished"
    );
    tracing::info!(
        successful = extraction.successful,
        failed = extraction.failed,
        total_characters = extraction.total_characters,
        average_characters = extraction.average_characters,
        success_rate = extraction.success_rate,
        "Text extraction"
    );

    let sample = error_sample(&report.results);
    for item in &sample.items {
        tracing::warn!(
            file = %item.file_name,
            id = %item.file_id,
            error = item.error.as_deref().unwrap_or_default(),
            "Failed document"
        );
    }
    if sample.remaining > 0 {
        tracing::warn!(remaining = sample.remaining, "Additional failures omitted");
    }
}
