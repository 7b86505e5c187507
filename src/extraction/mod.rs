//! Text extraction adapter: converter call, normalization, and acceptance policy.

pub mod converter;
pub mod normalize;

pub use converter::{CommandConverter, TextConverter};
pub use normalize::normalize_text;

use thiserror::Error;

/// Normalized text must be strictly longer than this many characters to be accepted.
pub const MIN_ACCEPTED_CHARS: usize = 50;

/// Reasons an extraction degraded to the placeholder.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Temporary input for the converter could not be written.
    #[error("Failed to prepare converter input: {0}")]
    TempFile(#[source] std::io::Error),
    /// Converter executable could not be started.
    #[error("Failed to run converter '{program}': {source}")]
    Spawn {
        /// Executable that failed to start.
        program: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Converter exited unsuccessfully.
    #[error("Converter exited with status {code:?}: {stderr}")]
    ConverterFailed {
        /// Exit code, when the process was not killed by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },
    /// Normalized text was too short to be useful.
    #[error("Extracted text too short ({length} characters)")]
    TooShort {
        /// Character count after normalization.
        length: usize,
    },
}

/// Text chosen for submission, either extracted content or the placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    /// Normalized text, or the diagnostic placeholder when not accepted.
    pub content: String,
    /// Whether the extracted text passed the acceptance rule.
    pub accepted: bool,
}

impl ExtractedText {
    /// Character count of accepted content; zero for placeholders.
    pub fn accepted_characters(&self) -> usize {
        if self.accepted {
            self.content.chars().count()
        } else {
            0
        }
    }
}

/// Placeholder submitted when no usable text could be extracted.
pub fn placeholder(file_name: &str, size_bytes: u64) -> String {
    format!("[Error extrayendo contenido del PDF - Archivo: {file_name}, Tamaño: {size_bytes} bytes]")
}

/// Apply the acceptance rule to already-normalized text.
pub fn accept(normalized: String) -> Result<String, ExtractionError> {
    let length = normalized.chars().count();
    if length > MIN_ACCEPTED_CHARS {
        Ok(normalized)
    } else {
        Err(ExtractionError::TooShort { length })
    }
}

/// Extract text from a downloaded document, degrading to the placeholder on failure.
///
/// The placeholder reports the length of `document` as downloaded.
pub fn extract_document(
    converter: &dyn TextConverter,
    document: &[u8],
    file_name: &str,
) -> ExtractedText {
    let size_bytes = document.len() as u64;
    let result = converter
        .convert(document)
        .map(|raw| normalize_text(&raw))
        .and_then(accept);

    match result {
        Ok(content) => {
            tracing::debug!(
                file = file_name,
                characters = content.chars().count(),
                "Text extracted"
            );
            ExtractedText {
                content,
                accepted: true,
            }
        }
        Err(error) => {
            tracing::warn!(file = file_name, size_bytes, error = %error, "Extraction degraded to placeholder");
            ExtractedText {
                content: placeholder(file_name, size_bytes),
                accepted: false,
            }
        }
    }
}
