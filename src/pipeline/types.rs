//! Job and error types for the per-document state machine.

use std::time::Duration;

use thiserror::Error;

use crate::storage::{StorageError, StorageObject};
use crate::submission::SubmissionError;

/// Message recorded when a document has no catalog entry.
pub const CATALOG_MISS_MESSAGE: &str = "No se encontró información del IADB";

/// One storage object selected for processing in this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Storage object backing the job.
    pub object: StorageObject,
}

/// Per-job failures; none of them abort the run.
#[derive(Debug, Error)]
pub enum JobError {
    /// The catalog has no record for the job's normalized name.
    #[error("{}", CATALOG_MISS_MESSAGE)]
    CatalogMiss,
    /// Downloading the object failed.
    #[error("Error descargando archivo: {0}")]
    Download(#[source] StorageError),
    /// The vectorization API failed or rejected the document.
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    /// Anything else raised while processing, including panics.
    #[error("{0}")]
    Unexpected(String),
}

/// Tunables for the sequential processing loop.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Pause between consecutive jobs.
    pub delay: Duration,
    /// Emit a progress line every this many processed jobs.
    pub progress_every: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(100),
            progress_every: 10,
        }
    }
}
