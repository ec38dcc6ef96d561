//! Snapshot creation

use chrono::{Local, Utc};
use docver_core::store::{atomic_write_new, copy_new};
use docver_core::{
    encode, sanitize_notes, Sequencer, StoreConfig, StoreLayout, VersionError, VersionId,
    VersionRecord, VersionResult,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extension used when the source document has none.
pub const FALLBACK_EXTENSION: &str = "bin";

/// Copies documents into the store and writes their records.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    layout: StoreLayout,
    sequencer: Sequencer,
    id_width: usize,
    author: Option<String>,
    host: Option<String>,
}

impl SnapshotStore {
    /// Snapshot store for a layout, with default id width and no provenance
    pub fn new(layout: StoreLayout) -> Self {
        let sequencer = Sequencer::new(&layout);
        Self {
            layout,
            sequencer,
            id_width: docver_core::record::DEFAULT_ID_WIDTH,
            author: None,
            host: None,
        }
    }

    /// Snapshot store configured from a [`StoreConfig`]
    pub fn from_config(config: &StoreConfig) -> VersionResult<Self> {
        config.validate()?;
        let layout =
            StoreLayout::from_config(config).map_err(|e| VersionError::storage(&config.root, e))?;

        let mut store = Self::new(layout);
        store.id_width = config.id_width;
        store.author = config.author.clone();
        store.host = config.host.clone();
        Ok(store)
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Copy `source` into the store as a new version.
    ///
    /// The id is allocated only once the source is known to exist. If the
    /// copy fails afterwards the id stays consumed and no record is written.
    pub fn create_snapshot(&self, source: &Path, notes: &str) -> VersionResult<VersionRecord> {
        let source = absolutize(source).map_err(|e| VersionError::storage(source, e))?;

        match fs::metadata(&source) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(VersionError::DocumentMissing(source));
            }
            Err(e) => return Err(VersionError::copy_failed(&source, self.layout.snapshots_dir(), e)),
        }

        self.layout
            .ensure_dirs()
            .map_err(|e| VersionError::storage(self.layout.snapshots_dir(), e))?;

        // 1. Allocate id
        let ordinal = self.sequencer.next()?;
        let id = VersionId::with_width(ordinal, self.id_width);
        let created_at = Utc::now();

        // 2. Copy bytes into a file nobody else can own
        let stamp = created_at.with_timezone(&Local).format("%Y%m%d_%H%M%S").to_string();
        let snapshot_path = self
            .layout
            .snapshot_path(&id, &stamp, snapshot_extension(&source));

        debug!(%id, from = %source.display(), to = %snapshot_path.display(), "Copying snapshot");
        let outcome = copy_new(&source, &snapshot_path).map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                return VersionError::SequencerRace(id);
            }
            warn!(%id, error = %e, "Snapshot copy failed, version id is consumed");
            VersionError::copy_failed(&source, &snapshot_path, e)
        })?;

        // 3. Publish the record
        let record = VersionRecord {
            id,
            created_at: Some(created_at),
            snapshot_path: snapshot_path.clone(),
            source_path: source,
            size_bytes: outcome.bytes,
            content_hash: Some(outcome.hash),
            notes: sanitize_notes(notes),
            author: self.author.clone(),
            host: self.host.clone(),
            extra: Default::default(),
        };

        let record_path = self.layout.record_path(&id);
        if let Err(e) = atomic_write_new(&record_path, encode(&record).as_bytes()) {
            if e.kind() == io::ErrorKind::AlreadyExists {
                // Another writer owns this id; our copy is unreferenced.
                let _ = fs::remove_file(&snapshot_path);
                return Err(VersionError::SequencerRace(id));
            }
            warn!(
                %id,
                snapshot = %snapshot_path.display(),
                error = %e,
                "Metadata write failed, snapshot file left without a record"
            );
            return Err(VersionError::MetadataWrite {
                id,
                leaked: snapshot_path,
                source: e,
            });
        }

        info!(%id, bytes = record.size_bytes, "Created snapshot");
        Ok(record)
    }
}

fn snapshot_extension(source: &Path) -> &str {
    source
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .unwrap_or(FALLBACK_EXTENSION)
}

pub(crate) fn absolutize(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
