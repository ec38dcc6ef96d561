//! On-disk layout and crash-safe file primitives

use crate::config::StoreConfig;
use crate::hash::{Blake3Hash, HashingWriter};
use crate::record::VersionId;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

/// File name of the sequencer counter inside the metadata directory.
pub const SEQUENCER_FILE: &str = "next_version.meta";
/// File name of the sequencer lock inside the metadata directory.
pub const SEQUENCER_LOCK_FILE: &str = "next_version.lock";
/// Extension of metadata records.
pub const RECORD_EXTENSION: &str = "meta";

/// Paths of one storage root
///
/// ```text
/// <root>/
///   Versions/
///     v001_20240301_093000.xlsx    # snapshot files
///     Metadata/
///       v001.meta                  # one record per version
///       next_version.meta          # sequencer counter
///       next_version.lock          # sequencer lock
///     logs/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    root: PathBuf,
    snapshots_dir: PathBuf,
    metadata_dir: PathBuf,
}

impl StoreLayout {
    /// Resolve the layout for a configuration.
    ///
    /// A relative root is anchored at the current directory so recorded
    /// snapshot paths stay valid when the process later changes directory.
    pub fn from_config(config: &StoreConfig) -> io::Result<Self> {
        let root = if config.root.is_absolute() {
            config.root.clone()
        } else {
            std::env::current_dir()?.join(&config.root)
        };
        let snapshots_dir = root.join(&config.versions_dir);
        let metadata_dir = snapshots_dir.join(&config.metadata_dir);

        Ok(Self {
            root,
            snapshots_dir,
            metadata_dir,
        })
    }

    /// Storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding snapshot files
    pub fn snapshots_dir(&self) -> &Path {
        &self.snapshots_dir
    }

    /// Directory holding metadata records
    pub fn metadata_dir(&self) -> &Path {
        &self.metadata_dir
    }

    /// Directory for log files
    pub fn logs_dir(&self) -> PathBuf {
        self.snapshots_dir.join("logs")
    }

    pub fn sequencer_path(&self) -> PathBuf {
        self.metadata_dir.join(SEQUENCER_FILE)
    }

    pub fn sequencer_lock_path(&self) -> PathBuf {
        self.metadata_dir.join(SEQUENCER_LOCK_FILE)
    }

    /// Path of the record for an id
    pub fn record_path(&self, id: &VersionId) -> PathBuf {
        self.metadata_dir.join(format!("{}.{}", id, RECORD_EXTENSION))
    }

    /// Path of the snapshot file for an id taken at `stamp` (`YYYYmmdd_HHMMSS`)
    pub fn snapshot_path(&self, id: &VersionId, stamp: &str, extension: &str) -> PathBuf {
        self.snapshots_dir
            .join(format!("{}_{}.{}", id, stamp, extension))
    }

    /// Create the snapshot and metadata directories (idempotent).
    pub fn ensure_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(&self.snapshots_dir)?;
        fs::create_dir_all(&self.metadata_dir)?;
        Ok(())
    }

    /// Whether a metadata directory entry is a version record.
    pub fn is_record_file(path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION)
            && path.file_name().and_then(|n| n.to_str()) != Some(SEQUENCER_FILE)
    }
}

/// Result of copying a file through [`copy_new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyOutcome {
    pub bytes: u64,
    pub hash: Blake3Hash,
}

/// Copy `from` into a new file at `to`, hashing as it goes.
///
/// The destination is opened create-new so an existing file is never
/// overwritten. The data is fsynced before returning. On any failure the
/// partially written destination is removed.
pub fn copy_new(from: &Path, to: &Path) -> io::Result<CopyOutcome> {
    let mut reader = BufReader::new(File::open(from)?);
    let dest = OpenOptions::new().write(true).create_new(true).open(to)?;

    let result = (|| -> io::Result<CopyOutcome> {
        let mut writer = HashingWriter::new(dest);
        io::copy(&mut reader, &mut writer)?;
        writer.flush()?;
        let (file, bytes, hash) = writer.finish();
        file.sync_all()?;
        Ok(CopyOutcome { bytes, hash })
    })();

    if result.is_err() {
        let _ = fs::remove_file(to);
    }
    result
}

/// Atomic write helper
///
/// Writes data to a temporary file in the target's directory, fsyncs it, then
/// renames it over the target path.
pub fn atomic_write(target: &Path, data: &[u8]) -> io::Result<()> {
    let mut temp = temp_file_beside(target)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist(target).map_err(|e| e.error)?;
    sync_parent(target);
    Ok(())
}

/// Atomic write that refuses to replace an existing target.
///
/// Fails with [`io::ErrorKind::AlreadyExists`] if `target` exists.
pub fn atomic_write_new(target: &Path, data: &[u8]) -> io::Result<()> {
    let mut temp = temp_file_beside(target)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist_noclobber(target).map_err(|e| e.error)?;
    sync_parent(target);
    Ok(())
}

/// Create a named temp file in the same directory as `target`.
pub fn temp_file_beside(target: &Path) -> io::Result<tempfile::NamedTempFile> {
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    tempfile::Builder::new()
        .prefix(".docver-")
        .suffix(".tmp")
        .tempfile_in(dir)
}

/// Best-effort fsync of the directory containing `path`.
#[cfg(unix)]
fn sync_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) {}
