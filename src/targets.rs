//! Loading of the target storage-object identifiers for a run.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};

/// Parse target ids from either a JSON array of strings or one id per line.
///
/// Blank lines and lines starting with `#` are ignored. Duplicates are dropped, keeping
/// the first occurrence so the original order survives.
pub fn parse_targets(raw: &str) -> Result<Vec<String>> {
    let trimmed = raw.trim_start();
    let ids: Vec<String> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).context("target list is not a JSON array of strings")?
    } else {
        trimmed
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect()
    };

    let mut seen = HashSet::new();
    Ok(ids
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect())
}

/// Read and parse the target file.
pub fn load_targets(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read target list at {}", path.display()))?;
    let targets = parse_targets(&raw)?;
    tracing::info!(path = %path.display(), targets = targets.len(), "Target list loaded");
    Ok(targets)
}
