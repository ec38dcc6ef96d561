//! Configuration management command
//!
//! Provides CLI interface to view and edit `docver.toml`.

use crate::system_config::{self, SystemConfig};
use crate::util;
use crate::AppContext;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;

/// Keys accepted by `get` and `set`
pub const KEYS: [&str; 11] = [
    "store.root",
    "store.versions_dir",
    "store.metadata_dir",
    "store.id_width",
    "provenance.author",
    "provenance.host",
    "provenance.detect",
    "retention.max_versions",
    "retention.remove_orphans",
    "log.level",
    "log.file",
];

/// List all configuration values
pub fn run_list(ctx: &AppContext) -> Result<()> {
    let config = &ctx.config;

    if ctx.json {
        return util::print_json(config);
    }

    println!("{}", "Configuration".bold());
    let state = if ctx.config_path.exists() { "" } else { " (not created, showing defaults)" };
    println!(
        "{}: {}{}\n",
        "Location".dimmed(),
        ctx.config_path.display().dimmed(),
        state.dimmed()
    );

    let mut section = "";
    for key in KEYS {
        let (name, field) = key.split_once('.').unwrap_or(("", key));
        if name != section {
            if !section.is_empty() {
                println!();
            }
            println!("{}", format!("[{}]", name).yellow());
            section = name;
        }
        let value = get_value(config, key)?;
        let shown = if value.is_empty() { "(unset)".dimmed().to_string() } else { value };
        println!("  {} = {}", field.cyan(), shown);
    }

    println!("\n{}", "Valid Ranges:".bold());
    println!("  store.id_width: 1-20");
    println!("  retention.max_versions: 0 keeps all");
    println!("  log.level: error, warn, info, debug, trace");

    Ok(())
}

/// Get a single configuration value
pub fn run_get(ctx: &AppContext, key: &str) -> Result<()> {
    let value = get_value(&ctx.config, key)?;
    println!("{}", value);
    Ok(())
}

/// Set a configuration value
pub fn run_set(ctx: &AppContext, key: &str, value: &str) -> Result<()> {
    let mut config = ctx.config.clone();
    set_value(&mut config, key, value)?;

    // Validate before saving
    config.validate().context("Invalid configuration value")?;

    system_config::save(&ctx.config_path, &config)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    Ok(())
}

/// Show the config file path and optionally create it
pub fn run_path(ctx: &AppContext, create: bool) -> Result<()> {
    let config_path = &ctx.config_path;

    if create && system_config::init_if_missing(config_path)? {
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else if config_path.exists() {
        println!("{}", config_path.display());
    } else {
        println!("{}", config_path.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub fn run_example() -> Result<()> {
    print!("{}", system_config::example_config());
    Ok(())
}

fn get_value(config: &SystemConfig, key: &str) -> Result<String> {
    let optional = |value: &Option<String>| value.clone().unwrap_or_default();

    let value = match key {
        "store.root" => config
            .store
            .root
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        "store.versions_dir" => config.store.versions_dir.clone(),
        "store.metadata_dir" => config.store.metadata_dir.clone(),
        "store.id_width" => config.store.id_width.to_string(),
        "provenance.author" => optional(&config.provenance.author),
        "provenance.host" => optional(&config.provenance.host),
        "provenance.detect" => config.provenance.detect.to_string(),
        "retention.max_versions" => config.retention.max_versions.to_string(),
        "retention.remove_orphans" => config.retention.remove_orphans.to_string(),
        "log.level" => config.log.level.clone(),
        "log.file" => config.log.file.to_string(),
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'dv config list' to see available keys.",
            key
        ),
    };
    Ok(value)
}

fn set_value(config: &mut SystemConfig, key: &str, value: &str) -> Result<()> {
    // An empty value clears optional keys
    let optional = |value: &str| {
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    };

    match key {
        "store.root" => config.store.root = optional(value).map(PathBuf::from),
        "store.versions_dir" => config.store.versions_dir = value.to_string(),
        "store.metadata_dir" => config.store.metadata_dir = value.to_string(),
        "store.id_width" => {
            config.store.id_width = value
                .parse()
                .context("Invalid value: must be a positive integer")?;
        }
        "provenance.author" => config.provenance.author = optional(value),
        "provenance.host" => config.provenance.host = optional(value),
        "provenance.detect" => {
            config.provenance.detect = value
                .parse()
                .context("Invalid value: must be 'true' or 'false'")?;
        }
        "retention.max_versions" => {
            config.retention.max_versions = value
                .parse()
                .context("Invalid value: must be a non-negative integer")?;
        }
        "retention.remove_orphans" => {
            config.retention.remove_orphans = value
                .parse()
                .context("Invalid value: must be 'true' or 'false'")?;
        }
        "log.level" => config.log.level = value.to_lowercase(),
        "log.file" => {
            config.log.file = value
                .parse()
                .context("Invalid value: must be 'true' or 'false'")?;
        }
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'dv config list' to see available keys.",
            key
        ),
    }
    Ok(())
}
