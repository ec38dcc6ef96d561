//! Single entry point over one storage root

use crate::catalog::{Catalog, CatalogScan, StoreStats, VersionFilter};
use crate::compare::{Comparator, ComparisonReport};
use crate::host::{DocumentHost, StatusSink, TracingStatus};
use crate::retention::{GarbageCollector, PruneReport, RetentionPolicy};
use crate::rollback::{RollbackCoordinator, RollbackResult};
use crate::snapshot::SnapshotStore;
use crate::verify::{verify, VerifyReport};
use docver_core::{StoreConfig, StoreLayout, VersionError, VersionRecord, VersionResult};
use std::path::Path;
use tracing::debug;

/// Snapshot, list, compare and roll back documents stored under one root.
///
/// Every operation reads the store from disk, so several `Vault`s (or
/// processes) may share a root.
pub struct Vault {
    store: SnapshotStore,
    catalog: Catalog,
    comparator: Comparator,
    rollback: RollbackCoordinator,
    status: Box<dyn StatusSink>,
}

impl Vault {
    /// Open the store described by `config`. Directories are created lazily.
    pub fn open(config: &StoreConfig) -> VersionResult<Self> {
        let store = SnapshotStore::from_config(config)?;
        let catalog = Catalog::new(store.layout().clone());
        debug!(root = %store.layout().root().display(), "Opened vault");

        Ok(Self {
            comparator: Comparator::new(catalog.clone()),
            rollback: RollbackCoordinator::new(catalog.clone()),
            catalog,
            store,
            status: Box::new(TracingStatus),
        })
    }

    /// Route progress messages to `sink` instead of the log.
    pub fn with_status(mut self, sink: impl StatusSink + 'static) -> Self {
        self.status = Box::new(sink);
        self
    }

    pub fn layout(&self) -> &StoreLayout {
        self.store.layout()
    }

    /// Create the storage directories.
    pub fn init(&self) -> VersionResult<()> {
        let layout = self.layout();
        layout
            .ensure_dirs()
            .map_err(|e| VersionError::storage(layout.snapshots_dir(), e))
    }

    /// Snapshot the document at `source`.
    pub fn create_snapshot(&self, source: &Path, notes: &str) -> VersionResult<VersionRecord> {
        self.status.status(&format!("Saving version of {}...", display_name(source)));
        let record = self.store.create_snapshot(source, notes)?;
        self.status.status(&format!("Saved {}", record.label()));
        Ok(record)
    }

    /// Ask the host to save, then snapshot what it saved.
    pub fn snapshot_document(
        &self,
        host: &mut dyn DocumentHost,
        notes: &str,
    ) -> VersionResult<VersionRecord> {
        host.save().map_err(VersionError::Host)?;
        self.create_snapshot(&host.document_path(), notes)
    }

    pub fn list_versions(&self) -> VersionResult<Vec<VersionRecord>> {
        self.catalog.list_versions()
    }

    /// Full scan including missing snapshots and malformed records.
    pub fn scan(&self) -> VersionResult<CatalogScan> {
        self.catalog.scan()
    }

    /// Resolve `v003`, `3` or `latest`.
    pub fn get(&self, reference: &str) -> VersionResult<VersionRecord> {
        self.catalog.resolve(reference)
    }

    pub fn search(&self, filter: &VersionFilter) -> VersionResult<Vec<VersionRecord>> {
        self.catalog.search(filter)
    }

    pub fn compare(&self, current: &Path, reference: &str) -> VersionResult<ComparisonReport> {
        self.comparator.compare(current, reference)
    }

    /// Replace `current` with a stored version, keeping a backup.
    pub fn rollback(&self, current: &Path, reference: &str) -> VersionResult<RollbackResult> {
        let version = self.catalog.resolve(reference)?;
        self.status.status(&format!(
            "Restoring {} to {}...",
            display_name(current),
            version.id
        ));
        let result = self.rollback.rollback_record(current, &version)?;
        self.status.status(&format!(
            "Restored {}; previous contents saved to {}",
            version.id,
            display_name(&result.backup_path)
        ));
        Ok(result)
    }

    pub fn stats(&self) -> VersionResult<StoreStats> {
        self.catalog.stats()
    }

    pub fn verify(&self, deep: bool) -> VersionResult<VerifyReport> {
        verify(&self.catalog, deep)
    }

    /// Apply a retention policy. Never runs implicitly.
    pub fn prune(&self, policy: RetentionPolicy, dry_run: bool) -> VersionResult<PruneReport> {
        GarbageCollector::new(policy).collect(&self.catalog, dry_run)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
