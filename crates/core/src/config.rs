//! Storage configuration

use crate::error::{VersionError, VersionResult};
use crate::record::DEFAULT_ID_WIDTH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where and how versions are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Storage root; the versions directory is created beneath it.
    pub root: PathBuf,

    /// Name of the snapshot directory under the root.
    pub versions_dir: String,

    /// Name of the metadata directory under the snapshot directory.
    pub metadata_dir: String,

    /// Minimum digits in rendered version ids.
    pub id_width: usize,

    /// Author recorded on new snapshots.
    pub author: Option<String>,

    /// Host recorded on new snapshots.
    pub host: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            versions_dir: "Versions".to_string(),
            metadata_dir: "Metadata".to_string(),
            id_width: DEFAULT_ID_WIDTH,
            author: None,
            host: None,
        }
    }
}

impl StoreConfig {
    /// Default configuration rooted at `root`.
    pub fn at(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Fill unset provenance fields from the environment (`USER`, `HOSTNAME`).
    pub fn with_detected_provenance(mut self) -> Self {
        if self.author.is_none() {
            self.author = env_non_empty(&["USER", "USERNAME"]);
        }
        if self.host.is_none() {
            self.host = env_non_empty(&["HOSTNAME", "COMPUTERNAME"]);
        }
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> VersionResult<()> {
        if !(1..=20).contains(&self.id_width) {
            return Err(VersionError::Config(format!(
                "id_width must be between 1 and 20, got {}",
                self.id_width
            )));
        }
        for (name, value) in [
            ("versions_dir", &self.versions_dir),
            ("metadata_dir", &self.metadata_dir),
        ] {
            if value.trim().is_empty() {
                return Err(VersionError::Config(format!("{name} must not be empty")));
            }
            if value.contains(['/', '\\']) || value == ".." {
                return Err(VersionError::Config(format!(
                    "{name} must be a single directory name, got {value:?}"
                )));
            }
        }
        Ok(())
    }
}

fn env_non_empty(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}
