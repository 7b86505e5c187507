//! Sequential per-document processing pipeline.

pub mod orchestrator;
pub mod types;

pub use orchestrator::{Pipeline, PipelineRun};
pub use types::{CATALOG_MISS_MESSAGE, Job, JobError, PipelineOptions};
