//! Docver configuration file
//!
//! Loaded from `--config`, then `DOCVER_CONFIG`, then `./docver.toml`.
//! A missing file means defaults.

use anyhow::{Context, Result};
use docver_core::store::atomic_write;
use docver_core::StoreConfig;
use journal::RetentionPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "DOCVER_CONFIG";

/// Default config file name, looked up in the current directory
pub const CONFIG_FILE_NAME: &str = "docver.toml";

/// Docver configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub store: StoreSection,
    pub provenance: ProvenanceSection,
    pub retention: RetentionSection,
    pub log: LogSection,
}

/// Where versions are stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Storage root; relative paths are taken from the config file's directory
    pub root: Option<PathBuf>,
    pub versions_dir: String,
    pub metadata_dir: String,
    pub id_width: usize,
}

impl Default for StoreSection {
    fn default() -> Self {
        let defaults = StoreConfig::default();
        Self {
            root: None,
            versions_dir: defaults.versions_dir,
            metadata_dir: defaults.metadata_dir,
            id_width: defaults.id_width,
        }
    }
}

/// Who and where snapshots are recorded as coming from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvenanceSection {
    pub author: Option<String>,
    pub host: Option<String>,
    /// Fill unset author and host from the environment
    pub detect: bool,
}

impl Default for ProvenanceSection {
    fn default() -> Self {
        Self {
            author: None,
            host: None,
            detect: true,
        }
    }
}

/// Limits applied by `dv gc`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionSection {
    /// Newest versions to keep; 0 keeps all
    pub max_versions: usize,
    pub remove_orphans: bool,
}

impl Default for RetentionSection {
    fn default() -> Self {
        Self {
            max_versions: 50,
            remove_orphans: false,
        }
    }
}

/// Log output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Level for the log file (`error`, `warn`, `info`, `debug`, `trace`)
    pub level: String,
    /// Write a daily log file under `<root>/Versions/logs`
    pub file: bool,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: true,
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

impl SystemConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.store_config(Path::new(".")).validate()?;

        if !LOG_LEVELS.contains(&self.log.level.as_str()) {
            anyhow::bail!(
                "log.level must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                self.log.level
            );
        }
        Ok(())
    }

    /// Store configuration with the root resolved.
    ///
    /// `base` anchors a relative `store.root`; without a configured root the
    /// store lives in `base` itself.
    pub fn store_config(&self, base: &Path) -> StoreConfig {
        let root = match &self.store.root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => base.join(root),
            None => base.to_path_buf(),
        };

        let config = StoreConfig {
            root,
            versions_dir: self.store.versions_dir.clone(),
            metadata_dir: self.store.metadata_dir.clone(),
            id_width: self.store.id_width,
            author: self.provenance.author.clone(),
            host: self.provenance.host.clone(),
        };

        if self.provenance.detect {
            config.with_detected_provenance()
        } else {
            config
        }
    }

    /// Retention policy for `dv gc`
    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            max_versions: match self.retention.max_versions {
                0 => None,
                n => Some(n),
            },
            remove_orphans: self.retention.remove_orphans,
        }
    }
}

/// Resolve the config file path.
pub fn config_file_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    Ok(cwd.join(CONFIG_FILE_NAME))
}

/// Load configuration from `path`, or defaults if it does not exist.
pub fn load(path: &Path) -> Result<SystemConfig> {
    if !path.exists() {
        return Ok(SystemConfig::default());
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: SystemConfig = toml::from_str(&text)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;

    Ok(config)
}

/// Validate and atomically write configuration to `path`.
pub fn save(path: &Path, config: &SystemConfig) -> Result<()> {
    config.validate().context("Refusing to save invalid configuration")?;

    let text = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    atomic_write(path, text.as_bytes())
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}

/// Write the default configuration if no file exists. Returns whether one was created.
pub fn init_if_missing(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save(path, &SystemConfig::default())?;
    Ok(true)
}

/// Commented example configuration
pub fn example_config() -> &'static str {
    r#"# Docver configuration (docver.toml)

[store]
# Storage root. Relative paths are taken from this file's directory.
# Defaults to the directory containing this file.
# root = "."
versions_dir = "Versions"
metadata_dir = "Metadata"
# Minimum digits in version ids (v001)
id_width = 3

[provenance]
# Recorded on every snapshot
# author = "analyst"
# host = "finance-01"
# Fill author and host from USER and HOSTNAME when unset
detect = true

[retention]
# Versions kept by `dv gc` (0 keeps all)
max_versions = 50
# Let `dv gc` delete snapshot files without records
remove_orphans = false

[log]
level = "info"
# Daily log file under <root>/Versions/logs
file = true
"#
}
