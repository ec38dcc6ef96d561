//! Show version details

use crate::AppContext;
use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;

/// Show detailed information about a version
pub fn run(ctx: &AppContext, version: &str) -> Result<()> {
    let vault = ctx.open_vault()?;
    let record = vault
        .get(version)
        .with_context(|| format!("Failed to resolve version '{}'", version))?;

    if ctx.json {
        return util::print_json(&record);
    }

    println!("{} {}", "version".yellow().bold(), record.id.to_string().cyan());

    if let Some(created_at) = record.created_at {
        println!(
            "{} {} ({})",
            "Date:      ".dimmed(),
            util::format_absolute_time(created_at),
            util::format_relative_time(created_at).dimmed()
        );
    }
    println!("{} {}", "Size:      ".dimmed(), util::format_size(record.size_bytes));
    if let Some(hash) = &record.content_hash {
        println!("{} {}", "Hash:      ".dimmed(), hash.to_hex().bright_green());
    }
    println!("{} {}", "Source:    ".dimmed(), record.source_path.display());
    println!("{} {}", "Snapshot:  ".dimmed(), record.snapshot_path.display());

    if let Some(author) = &record.author {
        println!("{} {}", "Author:    ".dimmed(), author);
    }
    if let Some(host) = &record.host {
        println!("{} {}", "Host:      ".dimmed(), host);
    }
    if let Some(notes) = &record.notes {
        println!("\n    {}", notes);
    }

    if !record.extra.is_empty() {
        println!("\n{}", "Extra fields:".bold());
        for (key, value) in &record.extra {
            println!("  {}: {}", key.cyan(), value);
        }
    }

    Ok(())
}
