//! Read-only document catalog keyed by normalized document name.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading the catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file could not be read.
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        /// Path that failed to load.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Catalog file is not a JSON array of records.
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Metadata describing one source document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogRecord {
    /// Document name as published by the catalog, usually the original file name.
    #[serde(alias = "documentKey", alias = "document_name", alias = "filename")]
    pub document_key: String,
    /// Human-readable document title.
    pub title: String,
    /// Canonical URL of the document in the catalog.
    #[serde(alias = "sourceUrl", alias = "url", alias = "link")]
    pub source_url: String,
}

/// Immutable mapping from normalized document name to catalog record.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    records: HashMap<String, CatalogRecord>,
}

impl Catalog {
    /// Build a catalog from records; duplicate keys keep the first record seen.
    pub fn from_records(records: impl IntoIterator<Item = CatalogRecord>) -> Self {
        let mut map = HashMap::new();
        for record in records {
            let key = normalize_document_name(&record.document_key);
            if key.is_empty() {
                tracing::warn!(title = %record.title, "Skipping catalog record without a document key");
                continue;
            }
            if map.contains_key(&key) {
                tracing::warn!(key = %key, "Duplicate catalog entry ignored");
                continue;
            }
            map.insert(key, record);
        }
        Self { records: map }
    }

    /// Parse a JSON array of records.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let records: Vec<CatalogRecord> = serde_json::from_str(raw)?;
        Ok(Self::from_records(records))
    }

    /// Load the catalog file once at start-up.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json(&raw)?;
        tracing::info!(path = %path.display(), records = catalog.len(), "Catalog loaded");
        Ok(catalog)
    }

    /// Resolve the record for a storage file name.
    pub fn lookup(&self, file_name: &str) -> Option<&CatalogRecord> {
        self.records.get(&normalize_document_name(file_name))
    }

    /// Number of distinct documents in the catalog.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// File name without directories or extension, trimmed.
pub fn normalize_document_name(name: &str) -> String {
    let base = name.trim().rsplit(['/', '\\']).next().unwrap_or_default();
    let stem = match base.rfind('.') {
        Some(idx) if idx > 0 => &base[..idx],
        _ => base,
    };
    stem.trim().to_string()
}
