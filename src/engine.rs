//! Discovery pass
//!
//! Runs the phases strictly in order: parse the roots, collect references,
//! inventory the base directory, diff, then report or prune. A root that fails
//! to parse ends the pass before the filesystem is scanned, so no deletion can
//! follow a failed walk.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use crate::collector::{CollectionReport, ReferenceSet, SchemaReferenceCollector, WalkOutcome};
use crate::config::Config;
use crate::error::Result;
use crate::inventory::SchemaInventory;
use crate::pruner::{PruneReport, Pruner};

/// Phases of a pass, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassPhase {
    Collect,
    Inventory,
    Diff,
    Prune,
}

impl fmt::Display for PassPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PassPhase::Collect => "collect",
            PassPhase::Inventory => "inventory",
            PassPhase::Diff => "diff",
            PassPhase::Prune => "prune",
        };
        f.write_str(name)
    }
}

/// Everything one pass found and did
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub base_dir: PathBuf,
    pub outcome: WalkOutcome,
    pub collection: CollectionReport,
    /// Number of schema files found under the base directory
    pub inventory_size: usize,
    /// Inventoried files that no root reaches
    pub unreferenced: ReferenceSet,
    /// Present only when pruning was requested
    pub prune: Option<PruneReport>,
    pub duration: Duration,
}

impl PassReport {
    pub fn has_deletion_failures(&self) -> bool {
        self.prune.as_ref().is_some_and(PruneReport::has_failures)
    }
}

pub struct SchemaGcEngine {
    config: Config,
}

impl SchemaGcEngine {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Configured base directory, or the directory of the first root
    pub fn resolve_base_dir(&self, roots: &[PathBuf]) -> PathBuf {
        if let Some(base_dir) = &self.config.inventory.base_dir {
            return base_dir.clone();
        }
        roots
            .first()
            .and_then(|root| root.parent())
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Run one full pass over `roots`
    pub async fn run(&self, roots: &[PathBuf]) -> Result<PassReport> {
        let start = Instant::now();
        let inventory_config = &self.config.inventory;
        let scanner = SchemaInventory::new()
            .with_extensions(inventory_config.extensions.clone())
            .with_exclude_patterns(inventory_config.exclude_patterns.clone())?
            .with_follow_symlinks(inventory_config.follow_symlinks);

        info!("Phase {}: {} root document(s)", PassPhase::Collect, roots.len());
        let collection = SchemaReferenceCollector::collect_from_paths(roots).await?;
        let outcome = collection.outcome();
        info!(
            "Collected {} referenced schema(s), {} issue(s), walk {:?}",
            collection.references.len(),
            collection.issues.len(),
            outcome
        );

        let base_dir = self.resolve_base_dir(roots);
        info!("Phase {}: {}", PassPhase::Inventory, base_dir.display());
        let inventory = scanner.inventory_xsd_files(&base_dir).await?;

        info!("Phase {}: {} inventoried file(s)", PassPhase::Diff, inventory.len());
        let unreferenced: ReferenceSet = inventory
            .unreferenced(&collection.references)
            .cloned()
            .collect();

        let prune = if self.config.prune.enabled {
            info!(
                "Phase {}: {} candidate(s){}",
                PassPhase::Prune,
                unreferenced.len(),
                if self.config.prune.dry_run { " (dry run)" } else { "" }
            );
            let pruner = Pruner::new()
                .with_dry_run(self.config.prune.dry_run)
                .with_force(self.config.prune.force);
            Some(pruner.prune_collected(&inventory, &collection).await?)
        } else {
            None
        };

        Ok(PassReport {
            base_dir,
            outcome,
            collection,
            inventory_size: inventory.len(),
            unreferenced,
            prune,
            duration: start.elapsed(),
        })
    }
}
