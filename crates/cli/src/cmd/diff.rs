//! Compare a document with a stored version

use crate::AppContext;
use crate::util;
use anyhow::{Context, Result};
use journal::Larger;
use owo_colors::OwoColorize;
use std::path::Path;

pub fn run(ctx: &AppContext, file: &Path, version: &str) -> Result<()> {
    let vault = ctx.open_vault()?;
    let report = vault
        .compare(file, version)
        .with_context(|| format!("Failed to compare {} with {}", file.display(), version))?;

    if ctx.json {
        return util::print_json(&report);
    }

    println!(
        "{} {} vs {}",
        "Comparing".bold(),
        report.current_path.display(),
        report.version.label().yellow()
    );
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Current size:   {}", util::format_size(report.current_size));
    println!("Version size:   {}", util::format_size(report.snapshot_size));

    let delta = util::format_delta(report.size_delta);
    let delta = match report.larger {
        Larger::Current => delta.green().to_string(),
        Larger::Snapshot => delta.red().to_string(),
        Larger::Equal => delta.dimmed().to_string(),
    };
    println!("Difference:     {}", delta);

    if let Some(modified) = report.current_modified {
        println!(
            "Last modified:  {} ({})",
            util::format_absolute_time(modified),
            util::format_relative_time(modified).dimmed()
        );
    }
    if let Some(created_at) = report.version.created_at {
        println!("Version saved:  {}", util::format_absolute_time(created_at));
    }
    println!();

    if report.identical {
        println!("{}", "Contents are identical".green());
    } else {
        println!("{}", "Contents differ".yellow());
    }

    Ok(())
}
