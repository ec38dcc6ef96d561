//! Seams to the application that owns the live document

use std::path::{Path, PathBuf};
use tracing::info;

/// The application hosting the live document.
pub trait DocumentHost {
    /// Path of the document as saved on disk.
    fn document_path(&self) -> PathBuf;

    /// Flush unsaved edits to [`DocumentHost::document_path`].
    fn save(&mut self) -> Result<(), String>;
}

/// A document that lives only on disk and is always saved.
#[derive(Debug, Clone)]
pub struct FileDocument {
    path: PathBuf,
}

impl FileDocument {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DocumentHost for FileDocument {
    fn document_path(&self) -> PathBuf {
        self.path.clone()
    }

    fn save(&mut self) -> Result<(), String> {
        Ok(())
    }
}

/// Receives short progress messages for display.
pub trait StatusSink: Send + Sync {
    fn status(&self, message: &str);
}

/// Sends status messages to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingStatus;

impl StatusSink for TracingStatus {
    fn status(&self, message: &str) {
        info!(target: "docver::status", "{}", message);
    }
}
