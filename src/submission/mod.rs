//! Vectorization API integration: one request per document, classified outcome.

pub mod client;
pub mod types;

pub use client::{VectorizeService, Vectorizer};
pub use types::{SubmissionError, SubmissionOutcome};
