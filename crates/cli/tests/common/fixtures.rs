//! Temporary working directories with documents

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temp directory used as both working directory and store root
pub struct TestStore {
    dir: TempDir,
}

impl TestStore {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a document relative to the root
    pub fn write(&self, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("Failed to write document");
        path
    }

    pub fn read(&self, name: &str) -> Vec<u8> {
        fs::read(self.dir.path().join(name)).expect("Failed to read document")
    }

    /// Backup files created by restores of `name`
    pub fn backups(&self, name: &str) -> Vec<PathBuf> {
        let prefix = format!("{}.pre-", name);
        let mut found: Vec<PathBuf> = fs::read_dir(self.dir.path())
            .expect("Failed to list temp dir")
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                let file_name = p.file_name().unwrap_or_default().to_string_lossy();
                file_name.starts_with(&prefix) && file_name.ends_with(".bak")
            })
            .collect();
        found.sort();
        found
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.dir.path().join("Versions/Metadata")
    }
}
