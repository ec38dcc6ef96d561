//! Error types for version storage operations.

use crate::record::VersionId;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for version operations.
pub type VersionResult<T> = Result<T, VersionError>;

/// Why a metadata record could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The record file does not exist or could not be read.
    #[error("metadata record unreadable: {0}")]
    Unreadable(String),

    /// The record has no content.
    #[error("metadata record is empty")]
    Empty,

    /// A required field is absent or blank.
    #[error("required field `{0}` is missing")]
    MissingField(&'static str),

    /// A field is present but malformed.
    #[error("field `{field}` has invalid value {value:?}")]
    InvalidField { field: &'static str, value: String },
}

/// Errors that can occur while snapshotting, listing, comparing or rolling back.
#[derive(Debug, Error)]
pub enum VersionError {
    /// Storage roots cannot be created or accessed.
    #[error("storage unavailable at {path}: {source}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata record could not be decoded.
    #[error("malformed metadata in {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    /// No record exists for the requested version.
    #[error("version not found: {0}")]
    VersionNotFound(String),

    /// The record exists but its snapshot file is gone.
    #[error("snapshot file for {id} is missing: {path}")]
    SnapshotFileMissing { id: VersionId, path: PathBuf },

    /// The snapshot no longer matches the hash recorded at creation.
    #[error("snapshot file for {id} was modified after creation: {path}")]
    SnapshotCorrupted { id: VersionId, path: PathBuf },

    /// The live document does not exist.
    #[error("document not found: {0}")]
    DocumentMissing(PathBuf),

    /// I/O failure while copying a snapshot, backup or restore.
    #[error("copy from {from} to {to} failed: {source}")]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot was written but its record was not.
    #[error("failed to write metadata for {id} (snapshot left at {leaked}): {source}")]
    MetadataWrite {
        id: VersionId,
        leaked: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two writers were handed the same id.
    #[error("version id {0} was allocated twice")]
    SequencerRace(VersionId),

    /// The sequencer counter could not be locked or persisted.
    #[error("sequencer at {path} failed: {source}")]
    Sequencer {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rollback failed after the backup was taken.
    ///
    /// `restored` reports whether the live document was put back from the
    /// backup before returning.
    #[error("rollback to {id} failed ({reason}); document restored from backup: {restored}; backup at {backup}")]
    RollbackFailed {
        id: VersionId,
        reason: String,
        restored: bool,
        backup: PathBuf,
    },

    /// The host collaborator failed to save the document.
    #[error("host failed to save document: {0}")]
    Host(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl VersionError {
    /// Create a version not found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::VersionNotFound(id.into())
    }

    /// Create a copy failed error.
    pub fn copy_failed(from: impl Into<PathBuf>, to: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CopyFailed {
            from: from.into(),
            to: to.into(),
            source,
        }
    }

    /// Create a storage unavailable error.
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::StorageUnavailable {
            path: path.into(),
            source,
        }
    }
}
