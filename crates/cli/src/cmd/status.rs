//! Show store status

use crate::AppContext;
use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;

pub fn run(ctx: &AppContext) -> Result<()> {
    let vault = ctx.open_vault()?;
    let layout = vault.layout();

    // 1. Gather stats
    let stats = vault.stats()?;
    let disk_usage = util::calculate_dir_size(layout.snapshots_dir())?;
    let initialized = layout.metadata_dir().is_dir();

    if ctx.json {
        return util::print_json(&serde_json::json!({
            "root": layout.root(),
            "initialized": initialized,
            "configFile": ctx.config_path,
            "stats": stats,
            "diskUsageBytes": disk_usage,
        }));
    }

    // 2. Display output
    println!("{}", "Version Store Status".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    println!("Store:         {}", layout.root().display().to_string().cyan());
    if !initialized {
        println!("               {}", "(not initialized)".yellow());
    }
    println!();

    println!("Latest version:");
    match stats.latest_version {
        Some(id) => {
            println!("  ID:          {}", id.to_string().yellow());
            if let Some(ts) = stats.latest_created_at {
                println!(
                    "  Time:        {} ({})",
                    util::format_relative_time(ts),
                    util::format_absolute_time(ts).dimmed()
                );
            }
        }
        None => println!("  {}", "No versions yet".dimmed()),
    }
    println!();

    println!("Storage:");
    println!("  Versions:    {}", stats.total_versions);
    if let Some(oldest) = stats.oldest_version {
        println!("  Oldest:      {}", oldest);
    }
    println!("  Snapshots:   {}", util::format_size(stats.total_size_bytes));
    println!("  Disk usage:  {}", util::format_size(disk_usage));
    println!("  Next id:     {}", stats.next_ordinal);
    println!();

    if stats.missing_snapshots > 0 || stats.malformed_records > 0 {
        println!(
            "{}",
            format!(
                "Warning: {} missing snapshot(s), {} malformed record(s). Run 'dv verify' for details.",
                stats.missing_snapshots, stats.malformed_records
            )
            .yellow()
        );
    }

    Ok(())
}
