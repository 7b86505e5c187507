//! Outcome and error types for vectorization submissions.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors returned by the vectorization API or its transport.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// Endpoint URL failed to parse.
    #[error("Invalid vectorization URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("API Error: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-2xx response, regardless of body.
    #[error("API Error: {} - {}", .status.as_u16(), .body)]
    UnexpectedStatus {
        /// HTTP status returned by the service.
        status: StatusCode,
        /// Raw response body.
        body: String,
    },
    /// 2xx response whose envelope reports `success: false`.
    #[error("{0}")]
    Rejected(String),
    /// 2xx response that could not be decoded.
    #[error("Invalid API response: {0}")]
    InvalidResponse(#[source] serde_json::Error),
}

/// Successful submission classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The service processed the document and created chunks.
    Indexed {
        /// Number of chunks created.
        chunks: usize,
    },
    /// The service already held the document; nothing new was created.
    Skipped {
        /// Chunk count the service reported for the existing document.
        existing_chunks: usize,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VectorizeResponse {
    pub(crate) success: bool,
    #[serde(default)]
    pub(crate) skipped: Option<bool>,
    #[serde(default)]
    pub(crate) existing_chunks: Option<usize>,
    #[serde(default)]
    pub(crate) results: Option<Vec<Value>>,
    #[serde(default)]
    pub(crate) error: Option<String>,
}

const UNKNOWN_ERROR: &str = "Error desconocido";

impl VectorizeResponse {
    pub(crate) fn classify(self) -> Result<SubmissionOutcome, SubmissionError> {
        if !self.success {
            return Err(SubmissionError::Rejected(
                self.error
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            ));
        }

        if self.skipped.unwrap_or(false) {
            return Ok(SubmissionOutcome::Skipped {
                existing_chunks: self.existing_chunks.unwrap_or(0),
            });
        }

        Ok(SubmissionOutcome::Indexed {
            chunks: self.results.map(|results| results.len()).unwrap_or(0),
        })
    }
}
