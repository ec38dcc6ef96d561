//! Per-invocation state shared by commands

use crate::system_config::{self, SystemConfig};
use anyhow::{Context, Result};
use docver_core::{StoreConfig, StoreLayout};
use journal::Vault;
use std::path::{Path, PathBuf};

/// Resolved configuration for one `dv` run
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config_path: PathBuf,
    pub config: SystemConfig,
    pub store: StoreConfig,
    /// Emit JSON instead of human-readable text
    pub json: bool,
}

impl AppContext {
    /// Load configuration and resolve the storage root.
    ///
    /// `--root` wins over `store.root`; a relative `store.root` is taken from
    /// the config file's directory.
    pub fn load(root: Option<&Path>, config: Option<&Path>, json: bool) -> Result<Self> {
        let config_path = system_config::config_file_path(config)?;
        let system = system_config::load(&config_path)?;

        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        let mut store = match root {
            Some(root) => {
                let mut overridden = system.clone();
                overridden.store.root = None;
                overridden.store_config(&cwd.join(root))
            }
            None => {
                let base = config_path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(|p| cwd.join(p))
                    .unwrap_or_else(|| cwd.clone());
                system.store_config(&base)
            }
        };
        if store.root.is_relative() {
            store.root = cwd.join(&store.root);
        }

        Ok(Self {
            config_path,
            config: system,
            store,
            json,
        })
    }

    /// Open the vault for the resolved store
    pub fn open_vault(&self) -> Result<Vault> {
        Vault::open(&self.store)
            .with_context(|| format!("Failed to open version store at {}", self.store.root.display()))
    }

    /// Log directory if the store has been initialized
    pub fn logs_dir(&self) -> Option<PathBuf> {
        let layout = StoreLayout::from_config(&self.store).ok()?;
        layout.snapshots_dir().is_dir().then(|| layout.logs_dir())
    }
}
