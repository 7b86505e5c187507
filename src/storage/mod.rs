//! Object storage integration: listing and downloading uploaded documents.

pub mod client;
pub mod types;

pub use client::{ObjectStore, StorageService};
pub use types::{StorageError, StorageObject};
