//! Manifest reconciliation against the processed-links ledger

use crate::db::processed::load_processed_links;
use crate::error::IngestResult;
use catalog_common::Database;
use std::collections::HashSet;

/// Manifest entries not present in `processed`, in manifest order
///
/// Duplicates inside the manifest are kept.
pub fn new_links(manifest: &[String], processed: &HashSet<String>) -> Vec<String> {
    manifest
        .iter()
        .filter(|link| !processed.contains(link.as_str()))
        .cloned()
        .collect()
}

/// Read the ledger and return the links that still need ingesting
pub async fn compute_delta(db: &Database, manifest: &[String]) -> IngestResult<Vec<String>> {
    let processed: HashSet<String> = load_processed_links(db).await?.into_iter().collect();
    let delta = new_links(manifest, &processed);

    if delta.is_empty() {
        tracing::info!("No new links");
    } else {
        tracing::info!(
            manifest = manifest.len(),
            already_processed = processed.len(),
            new = delta.len(),
            "Found new links"
        );
    }

    Ok(delta)
}
