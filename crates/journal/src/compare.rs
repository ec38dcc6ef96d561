//! Compare the live document against a stored version

use crate::catalog::Catalog;
use crate::snapshot::absolutize;
use chrono::{DateTime, Utc};
use docver_core::{hash_file, Blake3Hash, VersionError, VersionRecord, VersionResult};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which side of a comparison is larger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Larger {
    Current,
    Snapshot,
    Equal,
}

impl Larger {
    fn from_sizes(current: u64, snapshot: u64) -> Self {
        match current.cmp(&snapshot) {
            Ordering::Greater => Larger::Current,
            Ordering::Less => Larger::Snapshot,
            Ordering::Equal => Larger::Equal,
        }
    }
}

/// Result of comparing the live document with one version.
///
/// Fields may be added over time; hosts that compute richer differences
/// attach them under [`ComparisonReport::extensions`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct ComparisonReport {
    pub version: VersionRecord,
    pub current_path: PathBuf,
    pub current_size: u64,
    pub snapshot_size: u64,
    /// `current_size - snapshot_size`
    pub size_delta: i64,
    pub larger: Larger,
    pub current_modified: Option<DateTime<Utc>>,
    pub current_hash: Blake3Hash,
    pub snapshot_hash: Blake3Hash,
    /// Byte-for-byte identical
    pub identical: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl ComparisonReport {
    /// Attach a host-computed difference under `key`.
    pub fn insert_extension(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.extensions.insert(key.into(), value);
    }
}

/// Builds [`ComparisonReport`]s. Never modifies the document or the store.
#[derive(Debug, Clone)]
pub struct Comparator {
    catalog: Catalog,
}

impl Comparator {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// Compare `current` with the version named by `reference`.
    pub fn compare(&self, current: &Path, reference: &str) -> VersionResult<ComparisonReport> {
        let version = self.catalog.resolve(reference)?;
        self.compare_record(current, version)
    }

    /// Compare `current` with an already resolved record.
    pub fn compare_record(
        &self,
        current: &Path,
        version: VersionRecord,
    ) -> VersionResult<ComparisonReport> {
        let current_path = absolutize(current).map_err(|e| VersionError::storage(current, e))?;

        let current_meta = match fs::metadata(&current_path) {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Err(VersionError::DocumentMissing(current_path)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(VersionError::DocumentMissing(current_path));
            }
            Err(e) => return Err(VersionError::storage(&current_path, e)),
        };

        let snapshot_meta = fs::metadata(&version.snapshot_path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                VersionError::SnapshotFileMissing {
                    id: version.id,
                    path: version.snapshot_path.clone(),
                }
            } else {
                VersionError::storage(&version.snapshot_path, e)
            }
        })?;

        let current_hash =
            hash_file(&current_path).map_err(|e| VersionError::storage(&current_path, e))?;
        let snapshot_hash = hash_file(&version.snapshot_path)
            .map_err(|e| VersionError::storage(&version.snapshot_path, e))?;

        let current_size = current_meta.len();
        let snapshot_size = snapshot_meta.len();
        let size_delta = current_size as i64 - snapshot_size as i64;

        debug!(id = %version.id, size_delta, "Compared document with version");

        Ok(ComparisonReport {
            current_modified: current_meta.modified().ok().map(DateTime::<Utc>::from),
            larger: Larger::from_sizes(current_size, snapshot_size),
            identical: current_hash == snapshot_hash,
            version,
            current_path,
            current_size,
            snapshot_size,
            size_delta,
            current_hash,
            snapshot_hash,
            extensions: BTreeMap::new(),
        })
    }
}
