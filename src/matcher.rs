//! Correlation of target identifiers against the live storage listing.

use std::collections::HashMap;

use crate::pipeline::Job;
use crate::storage::StorageObject;

/// Jobs selected for a run plus the targets that could not be found in storage.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    /// Targets present in storage, in target-list order.
    pub jobs: Vec<Job>,
    /// Target ids absent from the listing; never attempted.
    pub missing: Vec<String>,
}

/// Index a storage listing by object id.
pub fn index_listing(objects: Vec<StorageObject>) -> HashMap<String, StorageObject> {
    objects
        .into_iter()
        .map(|object| (object.id.clone(), object))
        .collect()
}

/// Keep the targets that exist in storage, preserving the target order.
///
/// The catalog is not consulted here; a missing catalog entry fails its job later.
pub fn match_jobs(targets: &[String], listing: &HashMap<String, StorageObject>) -> MatchOutcome {
    let mut outcome = MatchOutcome::default();
    for id in targets {
        match listing.get(id) {
            Some(object) => outcome.jobs.push(Job {
                object: object.clone(),
            }),
            None => outcome.missing.push(id.clone()),
        }
    }

    tracing::info!(
        targets = targets.len(),
        matched = outcome.jobs.len(),
        missing = outcome.missing.len(),
        "Matched targets against storage listing"
    );
    if !outcome.missing.is_empty() {
        tracing::debug!(missing = ?outcome.missing, "Targets absent from storage");
    }
    outcome
}
