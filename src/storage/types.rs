//! Shared types used by the storage client.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors returned while interacting with the object storage service.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid storage URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Storage responded with an unexpected status code.
    #[error("Unexpected storage response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the storage service.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// One object currently present in the storage namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageObject {
    /// Stable object identifier assigned by the storage service.
    pub id: String,
    /// File name relative to the listed folder.
    pub name: String,
    /// Object size in bytes, when reported.
    pub size_bytes: Option<u64>,
    /// Creation timestamp as reported by the service.
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListedObject {
    #[serde(default)]
    pub(crate) id: Option<String>,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) created_at: Option<String>,
    #[serde(default)]
    pub(crate) metadata: Option<ListedMetadata>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListedMetadata {
    #[serde(default)]
    pub(crate) size: Option<u64>,
}

impl ListedObject {
    /// Folder placeholders come back without an id and are not objects.
    pub(crate) fn into_object(self) -> Option<StorageObject> {
        let id = self.id.filter(|value| !value.trim().is_empty())?;
        Some(StorageObject {
            id,
            name: self.name,
            size_bytes: self.metadata.and_then(|metadata| metadata.size),
            created_at: self.created_at,
        })
    }
}
