#![deny(missing_docs)]

//! Batch migration of stored IADB PDF documents into a vectorization service.

/// Read-only document catalog.
pub mod catalog;
/// Environment-driven configuration management.
pub mod config;
/// PDF text extraction and normalization.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Correlation of targets with the storage listing.
pub mod matcher;
/// End-to-end run assembly.
pub mod migration;
/// Submission payload construction.
pub mod payload;
/// Sequential per-document pipeline.
pub mod pipeline;
/// Run statistics and report persistence.
pub mod report;
/// Object storage integration.
pub mod storage;
/// Vectorization API client.
pub mod submission;
/// Target id list loading.
pub mod targets;
