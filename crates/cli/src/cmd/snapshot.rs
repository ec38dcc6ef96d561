//! Save a new version of a document

use crate::AppContext;
use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;

pub fn run(ctx: &AppContext, file: &Path, notes: Option<&str>) -> Result<()> {
    let vault = ctx.open_vault()?;

    let record = vault
        .create_snapshot(file, notes.unwrap_or(""))
        .with_context(|| format!("Failed to snapshot {}", file.display()))?;

    if ctx.json {
        return util::print_json(&record);
    }

    println!(
        "{} Saved {} ({})",
        "✓".green(),
        record.id.to_string().yellow().bold(),
        util::format_size(record.size_bytes)
    );
    if let Some(notes) = &record.notes {
        println!("  Notes:    {}", notes);
    }
    println!("  Snapshot: {}", record.snapshot_path.display().to_string().dimmed());
    Ok(())
}
