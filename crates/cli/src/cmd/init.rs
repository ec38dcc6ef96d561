//! Initialize a version store

use crate::AppContext;
use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;

pub fn run(ctx: &AppContext) -> Result<()> {
    let vault = ctx.open_vault()?;
    let layout = vault.layout();
    let existed = layout.metadata_dir().is_dir();

    vault.init().context("Failed to create version store")?;

    if ctx.json {
        return util::print_json(&serde_json::json!({
            "root": layout.root(),
            "snapshotsDir": layout.snapshots_dir(),
            "metadataDir": layout.metadata_dir(),
            "created": !existed,
        }));
    }

    if existed {
        println!("Version store already initialized at {}", layout.root().display());
        return Ok(());
    }

    println!("Initialized version store at {}", layout.root().display());
    println!();
    println!("Created directory structure:");
    println!("  - {}    (snapshot files)", layout.snapshots_dir().display());
    println!("  - {}    (version records)", layout.metadata_dir().display());
    println!();
    println!("Next steps:");
    println!("  - Run 'dv snapshot <file> -m \"notes\"' to save a version");
    println!("  - Run 'dv log' to list versions");
    println!("{}", "Tip: 'dv config example' prints a commented docver.toml".dimmed());
    Ok(())
}
