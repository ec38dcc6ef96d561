//! Read-only view over the metadata directory

use chrono::{DateTime, Utc};
use docver_core::{decode_file, Sequencer, StoreLayout, VersionError, VersionId, VersionRecord, VersionResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A record file that was skipped during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogWarning {
    pub path: PathBuf,
    pub reason: String,
}

/// Everything a scan of the metadata directory found.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogScan {
    /// Records whose snapshot file exists, ascending by id
    pub versions: Vec<VersionRecord>,
    /// Records whose snapshot file is gone, ascending by id
    pub missing: Vec<VersionRecord>,
    /// Record files that could not be used
    pub warnings: Vec<CatalogWarning>,
    /// Record file each id was loaded from
    #[serde(skip)]
    pub record_files: BTreeMap<VersionId, PathBuf>,
}

impl CatalogScan {
    fn find(&self, id: &VersionId) -> Option<&VersionRecord> {
        self.versions.iter().find(|r| r.id == *id)
    }

    fn find_missing(&self, id: &VersionId) -> Option<&VersionRecord> {
        self.missing.iter().find(|r| r.id == *id)
    }
}

/// Criteria for [`Catalog::search`]. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionFilter {
    /// Case-insensitive substring of the notes
    pub notes_contains: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
}

impl VersionFilter {
    /// Whether a record satisfies every set criterion.
    ///
    /// Records without a creation time never match a date bound.
    pub fn matches(&self, record: &VersionRecord) -> bool {
        if let Some(needle) = &self.notes_contains {
            let needle = needle.to_lowercase();
            let hit = record
                .notes
                .as_deref()
                .map(|notes| notes.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !hit {
                return false;
            }
        }

        if self.since.is_some() || self.until.is_some() {
            let Some(created_at) = record.created_at else {
                return false;
            };
            if self.since.is_some_and(|since| created_at < since) {
                return false;
            }
            if self.until.is_some_and(|until| created_at > until) {
                return false;
            }
        }

        if self.min_size.is_some_and(|min| record.size_bytes < min) {
            return false;
        }
        if self.max_size.is_some_and(|max| record.size_bytes > max) {
            return false;
        }
        true
    }
}

/// Summary of the store contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_versions: usize,
    pub total_size_bytes: u64,
    pub latest_version: Option<VersionId>,
    pub oldest_version: Option<VersionId>,
    pub latest_created_at: Option<DateTime<Utc>>,
    pub missing_snapshots: usize,
    pub malformed_records: usize,
    /// Ordinal the next snapshot will receive
    pub next_ordinal: u64,
}

/// Lists and resolves versions from their metadata records.
///
/// The metadata directory is the source of truth. Nothing is cached between
/// calls, so records written by other processes are visible immediately.
#[derive(Debug, Clone)]
pub struct Catalog {
    layout: StoreLayout,
}

impl Catalog {
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Scan every record file.
    ///
    /// A missing metadata directory is an empty catalog. Malformed records
    /// and duplicate ids are reported as warnings and skipped.
    pub fn scan(&self) -> VersionResult<CatalogScan> {
        let metadata_dir = self.layout.metadata_dir();
        let entries = match fs::read_dir(metadata_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %metadata_dir.display(), "No metadata directory, catalog is empty");
                return Ok(CatalogScan::default());
            }
            Err(e) => return Err(VersionError::storage(metadata_dir, e)),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| VersionError::storage(metadata_dir, e))?;
            let path = entry.path();
            if StoreLayout::is_record_file(&path) && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut scan = CatalogScan::default();
        let mut found: BTreeMap<VersionId, VersionRecord> = BTreeMap::new();

        for path in paths {
            let mut record = match decode_file(&path) {
                Ok(record) => record,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping malformed metadata record");
                    scan.warnings.push(CatalogWarning {
                        path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if let Some(first) = scan.record_files.get(&record.id) {
                warn!(
                    id = %record.id,
                    path = %path.display(),
                    kept = %first.display(),
                    "Skipping duplicate version id"
                );
                scan.warnings.push(CatalogWarning {
                    reason: format!("duplicate id {}, already defined by {}", record.id, first.display()),
                    path,
                });
                continue;
            }

            record.snapshot_path = self.resolve_snapshot_path(&record.snapshot_path);
            scan.record_files.insert(record.id, path);
            found.insert(record.id, record);
        }

        for (_, record) in found {
            if record.snapshot_path.is_file() {
                scan.versions.push(record);
            } else {
                debug!(id = %record.id, path = %record.snapshot_path.display(), "Snapshot file missing");
                scan.missing.push(record);
            }
        }

        Ok(scan)
    }

    /// Versions whose snapshot file exists, ascending by id.
    pub fn list_versions(&self) -> VersionResult<Vec<VersionRecord>> {
        Ok(self.scan()?.versions)
    }

    /// Resolve a version whose snapshot file exists.
    pub fn get(&self, id: &VersionId) -> VersionResult<VersionRecord> {
        let scan = self.scan()?;
        if let Some(record) = scan.find(id) {
            return Ok(record.clone());
        }
        if let Some(record) = scan.find_missing(id) {
            return Err(VersionError::SnapshotFileMissing {
                id: record.id,
                path: record.snapshot_path.clone(),
            });
        }
        Err(VersionError::not_found(id.to_string()))
    }

    /// Resolve a user-supplied reference: an id (`v3`, `v003`, `3`) or `latest`.
    pub fn resolve(&self, reference: &str) -> VersionResult<VersionRecord> {
        let reference = reference.trim();
        if reference.eq_ignore_ascii_case("latest") {
            return self
                .list_versions()?
                .pop()
                .ok_or_else(|| VersionError::not_found(reference));
        }

        let id = parse_reference(reference).ok_or_else(|| VersionError::not_found(reference))?;
        self.get(&id)
    }

    /// Versions matching a filter, ascending by id.
    pub fn search(&self, filter: &VersionFilter) -> VersionResult<Vec<VersionRecord>> {
        Ok(self
            .list_versions()?
            .into_iter()
            .filter(|record| filter.matches(record))
            .collect())
    }

    /// Store summary
    pub fn stats(&self) -> VersionResult<StoreStats> {
        let scan = self.scan()?;
        let versions = &scan.versions;
        let next_ordinal = Sequencer::new(&self.layout).peek()?;

        Ok(StoreStats {
            total_versions: versions.len(),
            total_size_bytes: versions.iter().map(|r| r.size_bytes).sum(),
            latest_version: versions.last().map(|r| r.id),
            oldest_version: versions.first().map(|r| r.id),
            latest_created_at: versions.iter().filter_map(|r| r.created_at).max(),
            missing_snapshots: scan.missing.len(),
            malformed_records: scan.warnings.len(),
            next_ordinal,
        })
    }

    // Relative paths are taken from the snapshot directory. An absolute path
    // that no longer exists falls back to the same file name in the snapshot
    // directory, which is where it lands after the store is moved.
    fn resolve_snapshot_path(&self, path: &Path) -> PathBuf {
        if !path.is_absolute() {
            return self.layout.snapshots_dir().join(path);
        }
        if path.is_file() {
            return path.to_path_buf();
        }
        match path.file_name() {
            Some(name) => {
                let moved = self.layout.snapshots_dir().join(name);
                if moved.is_file() {
                    debug!(
                        from = %path.display(),
                        to = %moved.display(),
                        "Snapshot found in moved store"
                    );
                    moved
                } else {
                    path.to_path_buf()
                }
            }
            None => path.to_path_buf(),
        }
    }
}

fn parse_reference(reference: &str) -> Option<VersionId> {
    if let Ok(id) = reference.parse::<VersionId>() {
        return Some(id);
    }
    reference.parse::<u64>().ok().map(VersionId::new)
}
