//! Store integrity checks

use crate::catalog::{Catalog, CatalogScan, CatalogWarning};
use docver_core::{hash_file, StoreLayout, VersionError, VersionId, VersionRecord, VersionResult};
use serde::Serialize;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Findings of [`verify`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyReport {
    /// Records examined, including those with missing snapshots
    pub checked: usize,
    /// Records whose snapshot file is gone
    pub missing: Vec<VersionRecord>,
    /// Record files that could not be used
    pub malformed: Vec<CatalogWarning>,
    /// Snapshot files no record refers to
    pub orphaned: Vec<PathBuf>,
    /// Snapshots whose size or hash differs from their record
    pub modified: Vec<VersionId>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty()
            && self.malformed.is_empty()
            && self.orphaned.is_empty()
            && self.modified.is_empty()
    }
}

/// Check every record against the snapshot directory.
///
/// Sizes are always compared. With `deep`, snapshot contents are re-hashed
/// and compared with the recorded hash as well.
pub fn verify(catalog: &Catalog, deep: bool) -> VersionResult<VerifyReport> {
    let scan = catalog.scan()?;
    let orphaned = orphaned_snapshots(catalog.layout(), &scan)?;

    let mut modified = Vec::new();
    for record in &scan.versions {
        if snapshot_modified(record, deep) {
            warn!(id = %record.id, "Snapshot differs from its record");
            modified.push(record.id);
        }
    }

    let report = VerifyReport {
        checked: scan.versions.len() + scan.missing.len(),
        missing: scan.missing,
        malformed: scan.warnings,
        orphaned,
        modified,
    };
    debug!(
        checked = report.checked,
        clean = report.is_clean(),
        "Verified store"
    );
    Ok(report)
}

fn snapshot_modified(record: &VersionRecord, deep: bool) -> bool {
    let size = match fs::metadata(&record.snapshot_path) {
        Ok(meta) => meta.len(),
        Err(_) => return true,
    };
    // Hand-written records may leave the size out.
    if record.size_bytes != 0 && size != record.size_bytes {
        return true;
    }
    match (deep, record.content_hash) {
        (true, Some(expected)) => hash_file(&record.snapshot_path)
            .map(|actual| actual != expected)
            .unwrap_or(true),
        _ => false,
    }
}

/// Regular files in the snapshot directory that no record refers to.
///
/// Dotfiles are skipped; they are in-flight temp files or not ours. A file
/// counts as referenced when any record names it, wherever that record
/// thinks the store lives.
pub fn orphaned_snapshots(layout: &StoreLayout, scan: &CatalogScan) -> VersionResult<Vec<PathBuf>> {
    let snapshots_dir = layout.snapshots_dir();
    let entries = match fs::read_dir(snapshots_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(VersionError::storage(snapshots_dir, e)),
    };

    // Matched by file name so records written before a move still count.
    let referenced: HashSet<&OsStr> = scan
        .versions
        .iter()
        .chain(scan.missing.iter())
        .filter_map(|record| record.snapshot_path.file_name())
        .collect();

    let mut orphaned = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| VersionError::storage(snapshots_dir, e))?;
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden || !path.is_file() || referenced.contains(entry.file_name().as_os_str()) {
            continue;
        }
        orphaned.push(path);
    }
    orphaned.sort();
    Ok(orphaned)
}
