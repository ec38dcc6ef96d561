//! Restore the live document to a stored version
//!
//! A rollback never leaves the document worse off than it found it: the
//! current bytes are copied to a backup before anything is written, and any
//! failure after that point puts the backup back.

use crate::catalog::Catalog;
use crate::snapshot::absolutize;
use chrono::Local;
use docver_core::store::{copy_new, temp_file_beside, CopyOutcome};
use docver_core::{hash_file, Blake3Hash, VersionError, VersionId, VersionRecord, VersionResult};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Upper bound on `-N` suffixes tried for one backup name.
const MAX_BACKUP_ATTEMPTS: u32 = 1000;

/// Replaces the contents of the live document.
pub trait ContentWriter {
    /// Make `target` hold exactly the bytes of `source`. Returns bytes written.
    fn replace_contents(&self, source: &Path, target: &Path) -> io::Result<u64>;
}

/// Writes a temp file beside the target and renames it into place.
///
/// The target keeps its permissions. Readers see either the old or the new
/// bytes, never a mix. A symlinked target is followed, so the link stays a
/// link and the file it points to gets the new bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomicReplace;

impl ContentWriter for AtomicReplace {
    fn replace_contents(&self, source: &Path, target: &Path) -> io::Result<u64> {
        let target = match fs::canonicalize(target) {
            Ok(resolved) => resolved,
            Err(e) if e.kind() == io::ErrorKind::NotFound => target.to_path_buf(),
            Err(e) => return Err(e),
        };
        let target = target.as_path();

        let mut reader = BufReader::new(File::open(source)?);
        let mut temp = temp_file_beside(target)?;
        let written = io::copy(&mut reader, &mut temp)?;
        temp.as_file().sync_all()?;

        if let Ok(meta) = fs::metadata(target) {
            fs::set_permissions(temp.path(), meta.permissions())?;
        }
        temp.persist(target).map_err(|e| e.error)?;
        Ok(written)
    }
}

/// Outcome of a successful rollback.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackResult {
    pub version: VersionId,
    pub document: PathBuf,
    pub snapshot_path: PathBuf,
    /// Copy of the document as it was before the rollback
    pub backup_path: PathBuf,
    pub bytes_written: u64,
    pub content_hash: Blake3Hash,
}

/// Runs rollbacks: validate, back up, swap, verify, compensate.
#[derive(Debug, Clone)]
pub struct RollbackCoordinator<W = AtomicReplace> {
    catalog: Catalog,
    writer: W,
}

impl RollbackCoordinator<AtomicReplace> {
    pub fn new(catalog: Catalog) -> Self {
        Self::with_writer(catalog, AtomicReplace)
    }
}

impl<W: ContentWriter> RollbackCoordinator<W> {
    /// Coordinator that swaps content through `writer`.
    pub fn with_writer(catalog: Catalog, writer: W) -> Self {
        Self { catalog, writer }
    }

    /// Roll `current` back to the version named by `reference`.
    pub fn rollback(&self, current: &Path, reference: &str) -> VersionResult<RollbackResult> {
        // 1. Validate before touching anything
        let version = self.catalog.resolve(reference)?;
        self.rollback_record(current, &version)
    }

    /// Roll `current` back to an already resolved record.
    pub fn rollback_record(
        &self,
        current: &Path,
        version: &VersionRecord,
    ) -> VersionResult<RollbackResult> {
        let document = absolutize(current).map_err(|e| VersionError::storage(current, e))?;
        match fs::metadata(&document) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(VersionError::DocumentMissing(document)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(VersionError::DocumentMissing(document));
            }
            Err(e) => return Err(VersionError::storage(&document, e)),
        }

        let snapshot_hash = self.check_snapshot(version)?;

        // 2. Backup
        let (backup_path, backup) = create_backup(&document, &version.id)?;
        debug!(backup = %backup_path.display(), "Backed up current document");

        // 3. Swap
        let bytes_written = match self.writer.replace_contents(&version.snapshot_path, &document) {
            Ok(bytes) => bytes,
            Err(e) => {
                return Err(self.compensate(
                    version,
                    &document,
                    &backup_path,
                    &backup,
                    format!("writing snapshot failed: {e}"),
                ));
            }
        };

        // 4. Verify
        match hash_file(&document) {
            Ok(hash) if hash == snapshot_hash => {}
            Ok(_) => {
                return Err(self.compensate(
                    version,
                    &document,
                    &backup_path,
                    &backup,
                    "document does not match snapshot after write".to_string(),
                ));
            }
            Err(e) => {
                return Err(self.compensate(
                    version,
                    &document,
                    &backup_path,
                    &backup,
                    format!("verifying document failed: {e}"),
                ));
            }
        }

        info!(id = %version.id, backup = %backup_path.display(), "Rolled back document");
        Ok(RollbackResult {
            version: version.id,
            document,
            snapshot_path: version.snapshot_path.clone(),
            backup_path,
            bytes_written,
            content_hash: snapshot_hash,
        })
    }

    /// Hash the snapshot and check it against the record.
    fn check_snapshot(&self, version: &VersionRecord) -> VersionResult<Blake3Hash> {
        let actual = hash_file(&version.snapshot_path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                VersionError::SnapshotFileMissing {
                    id: version.id,
                    path: version.snapshot_path.clone(),
                }
            } else {
                VersionError::storage(&version.snapshot_path, e)
            }
        })?;

        if let Some(expected) = version.content_hash {
            if expected != actual {
                warn!(
                    id = %version.id,
                    expected = %expected.short(),
                    actual = %actual.short(),
                    "Snapshot content does not match its record"
                );
                return Err(VersionError::SnapshotCorrupted {
                    id: version.id,
                    path: version.snapshot_path.clone(),
                });
            }
        }
        Ok(actual)
    }

    /// Put the backup back after a failed swap.
    fn compensate(
        &self,
        version: &VersionRecord,
        document: &Path,
        backup_path: &Path,
        backup: &CopyOutcome,
        reason: String,
    ) -> VersionError {
        warn!(id = %version.id, %reason, "Rollback failed, restoring from backup");

        // Restoring goes through the atomic writer regardless of `W`.
        let restored = AtomicReplace
            .replace_contents(backup_path, document)
            .and_then(|_| hash_file(document))
            .map(|hash| hash == backup.hash)
            .unwrap_or(false);

        if !restored {
            error!(
                id = %version.id,
                document = %document.display(),
                backup = %backup_path.display(),
                "Could not restore document, recover it from the backup"
            );
        }

        VersionError::RollbackFailed {
            id: version.id,
            reason,
            restored,
            backup: backup_path.to_path_buf(),
        }
    }
}

/// Copy the document to a backup beside it that no other file occupies.
///
/// Names follow `<file>.pre-<id>.<YYYYmmddTHHMMSS>.bak`, with `-2`, `-3`, ...
/// appended to the stamp when a rollback in the same second already used it.
fn create_backup(document: &Path, id: &VersionId) -> VersionResult<(PathBuf, CopyOutcome)> {
    let file_name = document
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let stamp = Local::now().format("%Y%m%dT%H%M%S").to_string();

    for attempt in 1..=MAX_BACKUP_ATTEMPTS {
        let name = if attempt == 1 {
            format!("{file_name}.pre-{id}.{stamp}.bak")
        } else {
            format!("{file_name}.pre-{id}.{stamp}-{attempt}.bak")
        };
        let candidate = document.with_file_name(name);

        match copy_new(document, &candidate) {
            Ok(outcome) => return Ok((candidate, outcome)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(VersionError::copy_failed(document, &candidate, e)),
        }
    }

    Err(VersionError::copy_failed(
        document,
        document.with_file_name(format!("{file_name}.pre-{id}.{stamp}.bak")),
        io::Error::new(io::ErrorKind::AlreadyExists, "no free backup name"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::Comparator;
    use crate::snapshot::SnapshotStore;
    use docver_core::StoreConfig;
    use std::io::Write;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        store: SnapshotStore,
        catalog: Catalog,
        doc: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let store = SnapshotStore::from_config(&StoreConfig::at(dir.path())).unwrap();
            let catalog = Catalog::new(store.layout().clone());
            let doc = dir.path().join("budget.xlsx");
            Self {
                dir,
                store,
                catalog,
                doc,
            }
        }

        fn snapshot(&self, contents: &[u8]) -> VersionRecord {
            fs::write(&self.doc, contents).unwrap();
            self.store.create_snapshot(&self.doc, "").unwrap()
        }

        fn backups(&self) -> Vec<PathBuf> {
            let mut found: Vec<_> = fs::read_dir(self.dir.path())
                .unwrap()
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.to_string_lossy().ends_with(".bak"))
                .collect();
            found.sort();
            found
        }
    }

    /// Writes only half the snapshot.
    struct TruncatingWriter;

    impl ContentWriter for TruncatingWriter {
        fn replace_contents(&self, source: &Path, target: &Path) -> io::Result<u64> {
            let bytes = fs::read(source)?;
            let half = &bytes[..bytes.len() / 2];
            let mut file = File::create(target)?;
            file.write_all(half)?;
            Ok(half.len() as u64)
        }
    }

    /// Clobbers the target, then reports an error.
    struct FailingWriter;

    impl ContentWriter for FailingWriter {
        fn replace_contents(&self, _source: &Path, target: &Path) -> io::Result<u64> {
            fs::write(target, b"garbage")?;
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
    }

    #[test]
    fn test_rollback_restores_snapshot_and_keeps_backup() {
        let fx = Fixture::new();
        fx.snapshot(b"version one");
        fs::write(&fx.doc, b"edited afterwards").unwrap();

        let result = RollbackCoordinator::new(fx.catalog.clone())
            .rollback(&fx.doc, "v001")
            .unwrap();

        assert_eq!(fs::read(&fx.doc).unwrap(), b"version one");
        assert_eq!(fs::read(&result.backup_path).unwrap(), b"edited afterwards");
        assert_eq!(result.bytes_written, 11);

        let name = result.backup_path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("budget.xlsx.pre-v001."), "{name}");
        assert!(name.ends_with(".bak"), "{name}");
    }

    #[test]
    fn test_rollback_then_compare_shows_no_change() {
        let fx = Fixture::new();
        fx.snapshot(&[1u8; 20480]);
        fs::write(&fx.doc, vec![2u8; 21504]).unwrap();

        RollbackCoordinator::new(fx.catalog.clone())
            .rollback(&fx.doc, "v001")
            .unwrap();

        let report = Comparator::new(fx.catalog.clone()).compare(&fx.doc, "v001").unwrap();
        assert_eq!(report.size_delta, 0);
        assert!(report.identical);
    }

    #[test]
    fn test_unknown_version_leaves_document_untouched() {
        let fx = Fixture::new();
        fx.snapshot(b"one");
        fs::write(&fx.doc, b"current").unwrap();

        let err = RollbackCoordinator::new(fx.catalog.clone())
            .rollback(&fx.doc, "v999")
            .unwrap_err();

        assert!(matches!(err, VersionError::VersionNotFound(_)));
        assert_eq!(fs::read(&fx.doc).unwrap(), b"current");
        assert!(fx.backups().is_empty());
    }

    #[test]
    fn test_missing_document_is_rejected() {
        let fx = Fixture::new();
        fx.snapshot(b"one");
        fs::remove_file(&fx.doc).unwrap();

        let err = RollbackCoordinator::new(fx.catalog.clone())
            .rollback(&fx.doc, "v001")
            .unwrap_err();
        assert!(matches!(err, VersionError::DocumentMissing(_)));
    }

    #[test]
    fn test_tampered_snapshot_is_refused() {
        let fx = Fixture::new();
        let record = fx.snapshot(b"original");
        fs::write(&record.snapshot_path, b"tampered").unwrap();
        fs::write(&fx.doc, b"current").unwrap();

        let err = RollbackCoordinator::new(fx.catalog.clone())
            .rollback(&fx.doc, "v001")
            .unwrap_err();

        assert!(matches!(err, VersionError::SnapshotCorrupted { .. }));
        assert_eq!(fs::read(&fx.doc).unwrap(), b"current");
        assert!(fx.backups().is_empty());
    }

    #[test]
    fn test_truncated_write_is_restored_from_backup() {
        let fx = Fixture::new();
        fx.snapshot(b"the full snapshot contents");
        fs::write(&fx.doc, b"work in progress").unwrap();

        let err = RollbackCoordinator::with_writer(fx.catalog.clone(), TruncatingWriter)
            .rollback(&fx.doc, "v001")
            .unwrap_err();

        match err {
            VersionError::RollbackFailed {
                restored, backup, ..
            } => {
                assert!(restored);
                assert_eq!(fs::read(&backup).unwrap(), b"work in progress");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fs::read(&fx.doc).unwrap(), b"work in progress");
    }

    #[test]
    fn test_failed_write_is_restored_from_backup() {
        let fx = Fixture::new();
        fx.snapshot(b"snapshot");
        fs::write(&fx.doc, b"current").unwrap();

        let err = RollbackCoordinator::with_writer(fx.catalog.clone(), FailingWriter)
            .rollback(&fx.doc, "v001")
            .unwrap_err();

        assert!(matches!(err, VersionError::RollbackFailed { restored: true, .. }));
        assert_eq!(fs::read(&fx.doc).unwrap(), b"current");
    }

    #[test]
    fn test_repeated_rollbacks_get_distinct_backups() {
        let fx = Fixture::new();
        fx.snapshot(b"one");
        let coordinator = RollbackCoordinator::new(fx.catalog.clone());

        let mut seen = Vec::new();
        for i in 0..3 {
            fs::write(&fx.doc, format!("edit {i}")).unwrap();
            let result = coordinator.rollback(&fx.doc, "v001").unwrap();
            assert!(!seen.contains(&result.backup_path));
            seen.push(result.backup_path);
        }

        assert_eq!(fx.backups().len(), 3);
        for (i, backup) in seen.iter().enumerate() {
            assert_eq!(fs::read_to_string(backup).unwrap(), format!("edit {i}"));
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_permissions_survive_rollback() {
        use std::os::unix::fs::PermissionsExt;

        let fx = Fixture::new();
        fx.snapshot(b"one");
        fs::set_permissions(&fx.doc, fs::Permissions::from_mode(0o640)).unwrap();

        RollbackCoordinator::new(fx.catalog.clone())
            .rollback(&fx.doc, "v001")
            .unwrap();

        let mode = fs::metadata(&fx.doc).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[test]
    #[cfg(unix)]
    fn test_symlinked_document_stays_a_link() {
        let fx = Fixture::new();
        let real_dir = fx.dir.path().join("shared");
        fs::create_dir_all(&real_dir).unwrap();
        let real = real_dir.join("budget.xlsx");
        fs::write(&real, b"original").unwrap();
        std::os::unix::fs::symlink(&real, &fx.doc).unwrap();

        fx.store.create_snapshot(&fx.doc, "").unwrap();
        fs::write(&real, b"edited later").unwrap();

        RollbackCoordinator::new(fx.catalog.clone())
            .rollback(&fx.doc, "v001")
            .unwrap();

        assert!(fs::symlink_metadata(&fx.doc).unwrap().file_type().is_symlink());
        assert_eq!(fs::read(&real).unwrap(), b"original");
        assert_eq!(fs::read_to_string(&fx.backups()[0]).unwrap(), "edited later");
    }
}
