//! Removal of schema files that no reference reaches
//!
//! Deletion is irreversible, so the only way in from a discovery pass is
//! [`Pruner::prune_collected`]. It refuses to act on a walk that could not
//! parse one of the schemas it reached, or whose unresolved locations look
//! like they meant one of the deletion candidates.

use std::collections::HashSet;
use std::ffi::OsStr;

use serde::Serialize;
use tracing::{info, warn};

use crate::collector::{
    CollectionReport, ReferenceIssue, ReferenceSet, SchemaReference, WalkOutcome,
};
use crate::error::{DeletionError, Result, SchemaGcError};
use crate::inventory::FileInventory;

/// Outcome of one prune step
#[derive(Debug, Clone, Default, Serialize)]
pub struct PruneReport {
    /// Files deleted, or that would be deleted in a dry run
    pub pruned: ReferenceSet,
    /// Files that could not be deleted
    pub failures: Vec<DeletionError>,
    /// Inventoried files kept because they are referenced
    pub retained: ReferenceSet,
    pub dry_run: bool,
}

impl PruneReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn failed_paths(&self) -> ReferenceSet {
        self.failures
            .iter()
            .map(|f| SchemaReference::from_canonical(f.path.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pruner {
    dry_run: bool,
    force: bool,
}

impl Pruner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report candidates without deleting anything
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Prune even when some referenced schema could not be parsed
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Prune against a finished discovery pass.
    ///
    /// A degraded walk may be missing whatever the unparsable schemas
    /// reference, so it is refused unless forced. So is a walk where a
    /// candidate has the file name of a location that did not resolve.
    pub async fn prune_collected(
        &self,
        inventory: &FileInventory,
        collection: &CollectionReport,
    ) -> Result<PruneReport> {
        if collection.outcome() == WalkOutcome::Degraded {
            if !self.force {
                return Err(SchemaGcError::PruneRefused {
                    unparsable: collection.unparsable_count(),
                });
            }
            warn!(
                "Pruning despite {} unparsable schema(s)",
                collection.unparsable_count()
            );
        }

        let suspects = unresolved_matches(inventory, collection);
        if !suspects.is_empty() {
            for suspect in &suspects {
                warn!("{} matches a schemaLocation that did not resolve", suspect);
            }
            if !self.force {
                return Err(SchemaGcError::UnresolvedMatch {
                    candidates: suspects.len(),
                });
            }
        }

        Ok(self.prune_unreferenced(inventory, &collection.references).await)
    }

    /// Delete every inventoried file absent from `references`; never fails
    pub async fn prune_unreferenced(
        &self,
        inventory: &FileInventory,
        references: &ReferenceSet,
    ) -> PruneReport {
        let mut report = PruneReport {
            retained: inventory.referenced(references).cloned().collect(),
            dry_run: self.dry_run,
            ..Default::default()
        };

        for candidate in inventory.unreferenced(references) {
            if self.dry_run {
                info!("Would delete {}", candidate);
                report.pruned.insert(candidate.clone());
                continue;
            }

            match tokio::fs::remove_file(candidate.path()).await {
                Ok(()) => {
                    info!("Deleted {}", candidate);
                    report.pruned.insert(candidate.clone());
                }
                Err(e) => {
                    warn!("Failed to delete {}: {}", candidate, e);
                    report.failures.push(DeletionError {
                        path: candidate.path().to_path_buf(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        report
    }
}

/// Unreferenced files named like the target of a missing location
fn unresolved_matches<'a>(
    inventory: &'a FileInventory,
    collection: &'a CollectionReport,
) -> Vec<&'a SchemaReference> {
    let missing: HashSet<&OsStr> = collection
        .issues
        .iter()
        .filter_map(ReferenceIssue::missing_target)
        .filter_map(|target| target.file_name())
        .collect();
    if missing.is_empty() {
        return Vec::new();
    }

    inventory
        .unreferenced(&collection.references)
        .filter(|candidate| {
            candidate
                .path()
                .file_name()
                .is_some_and(|name| missing.contains(name))
        })
        .collect()
}

/// Delete every inventoried file absent from `references`
pub async fn prune_unreferenced(inventory: &FileInventory, references: &ReferenceSet) -> PruneReport {
    Pruner::new().prune_unreferenced(inventory, references).await
}
