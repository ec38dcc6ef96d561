//! Retention policies and garbage collection
//!
//! Nothing here runs on its own. Snapshot creation never deletes old
//! versions; pruning happens only when a caller asks for it.

use crate::catalog::Catalog;
use crate::verify::orphaned_snapshots;
use docver_core::{VersionError, VersionId, VersionRecord, VersionResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Retention policy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    /// Number of newest versions to keep (`None` keeps all)
    pub max_versions: Option<usize>,
    /// Also delete snapshot files without a record and records without a snapshot
    pub remove_orphans: bool,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_versions: Some(50),
            remove_orphans: false,
        }
    }
}

/// What a collection removed, or would remove on a dry run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneReport {
    pub dry_run: bool,
    /// Versions whose record and snapshot were deleted
    pub removed: Vec<VersionId>,
    /// Records deleted because their snapshot was already gone
    pub dangling_records: Vec<VersionId>,
    /// Snapshot files deleted because no record referred to them
    pub orphaned_files: Vec<PathBuf>,
    pub bytes_freed: u64,
}

/// Garbage collector
pub struct GarbageCollector {
    policy: RetentionPolicy,
}

impl GarbageCollector {
    /// Create a new GC with the given policy
    pub fn new(policy: RetentionPolicy) -> Self {
        Self { policy }
    }

    /// Versions the policy would drop, oldest first.
    pub fn expired<'a>(&self, versions: &'a [VersionRecord]) -> &'a [VersionRecord] {
        match self.policy.max_versions {
            Some(keep) if versions.len() > keep => &versions[..versions.len() - keep],
            _ => &[],
        }
    }

    /// Run garbage collection
    ///
    /// Each version's record is deleted before its snapshot, so an
    /// interruption leaves at worst an orphaned file, never a record that
    /// points at nothing.
    pub fn collect(&self, catalog: &Catalog, dry_run: bool) -> VersionResult<PruneReport> {
        let scan = catalog.scan()?;
        let mut report = PruneReport {
            dry_run,
            ..Default::default()
        };

        // 1. Versions beyond the retention limit
        for record in self.expired(&scan.versions) {
            let Some(record_file) = scan.record_files.get(&record.id) else {
                continue;
            };
            let size = fs::metadata(&record.snapshot_path).map(|m| m.len()).unwrap_or(0);
            if !dry_run {
                remove(record_file)?;
                remove(&record.snapshot_path)?;
            }
            report.removed.push(record.id);
            report.bytes_freed += size;
        }

        if self.policy.remove_orphans {
            // 2. Records whose snapshot is gone
            for record in &scan.missing {
                if let Some(record_file) = scan.record_files.get(&record.id) {
                    if !dry_run {
                        remove(record_file)?;
                    }
                    report.dangling_records.push(record.id);
                }
            }

            // 3. Snapshot files nobody refers to
            for path in orphaned_snapshots(catalog.layout(), &scan)? {
                let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                if !dry_run {
                    remove(&path)?;
                }
                report.orphaned_files.push(path);
                report.bytes_freed += size;
            }
        }

        info!(
            dry_run,
            removed = report.removed.len(),
            dangling = report.dangling_records.len(),
            orphaned = report.orphaned_files.len(),
            bytes = report.bytes_freed,
            "Garbage collection finished"
        );
        Ok(report)
    }
}

fn remove(path: &Path) -> VersionResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Already removed");
            Ok(())
        }
        Err(e) => Err(VersionError::storage(path, e)),
    }
}
