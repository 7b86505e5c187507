//! Serialized shapes of the run report.

use serde::Serialize;

/// Terminal state of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult {
    /// Storage object identifier.
    pub file_id: String,
    /// Storage file name.
    pub file_name: String,
    /// Whether the document reached the vectorization service successfully.
    pub success: bool,
    /// Set when the service reported the document as already indexed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,
    /// Chunks newly created for this document.
    pub chunks: usize,
    /// Failure message for unsuccessful jobs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemResult {
    /// Successful submission that created `chunks` chunks.
    pub fn indexed(file_id: &str, file_name: &str, chunks: usize) -> Self {
        Self {
            file_id: file_id.to_string(),
            file_name: file_name.to_string(),
            success: true,
            skipped: None,
            chunks,
            error: None,
        }
    }

    /// Successful submission of a document the service already held.
    pub fn skipped(file_id: &str, file_name: &str) -> Self {
        Self {
            skipped: Some(true),
            ..Self::indexed(file_id, file_name, 0)
        }
    }

    /// Failed job carrying the error message.
    pub fn failed(file_id: &str, file_name: &str, error: impl Into<String>) -> Self {
        Self {
            file_id: file_id.to_string(),
            file_name: file_name.to_string(),
            success: false,
            skipped: None,
            chunks: 0,
            error: Some(error.into()),
        }
    }

    /// Whether this result is an idempotent skip.
    pub fn is_skipped(&self) -> bool {
        self.skipped.unwrap_or(false)
    }
}

/// Job-level totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Jobs selected for the run.
    pub total_files: usize,
    /// Jobs that produced a result.
    pub processed: usize,
    /// Jobs that succeeded, including skips.
    pub successful: usize,
    /// Jobs that failed.
    pub errors: usize,
    /// Successful jobs the service reported as already indexed.
    pub skipped: usize,
    /// Chunks newly created across the run.
    pub chunks_created: usize,
    /// `successful / processed` as a percentage with two decimals.
    pub success_rate: f64,
}

/// Extraction totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextExtractionSummary {
    /// Extractions that passed the acceptance rule.
    pub successful: usize,
    /// Extractions that fell back to the placeholder.
    pub failed: usize,
    /// Characters across accepted extractions.
    pub total_characters: usize,
    /// Rounded mean characters per accepted extraction.
    pub average_characters: usize,
    /// `successful / processed` as a percentage with two decimals.
    pub success_rate: f64,
}

/// Final artifact of a run, written once.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Job-level totals.
    pub summary: RunSummary,
    /// Extraction totals.
    pub text_extraction: TextExtractionSummary,
    /// One entry per job, in job order.
    pub results: Vec<ItemResult>,
    /// RFC 3339 time the report was produced.
    pub generated_at: String,
}
