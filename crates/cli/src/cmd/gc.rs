//! Run garbage collection

use crate::AppContext;
use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;

pub fn run(ctx: &AppContext, keep: Option<usize>, orphans: bool, dry_run: bool) -> Result<()> {
    let vault = ctx.open_vault()?;

    // 1. Policy from config, overridden by flags
    let mut policy = ctx.config.retention_policy();
    if let Some(keep) = keep {
        policy.max_versions = if keep == 0 { None } else { Some(keep) };
    }
    if orphans {
        policy.remove_orphans = true;
    }

    // 2. Collect
    let report = vault.prune(policy, dry_run)?;

    if ctx.json {
        return util::print_json(&report);
    }

    // 3. Display results
    if dry_run {
        println!("{}", "GC Dry Run".yellow().bold());
    } else {
        println!("{}", "GC Complete".green().bold());
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    if report.removed.is_empty()
        && report.dangling_records.is_empty()
        && report.orphaned_files.is_empty()
    {
        println!("{}", "No garbage found - store is already clean".dimmed());
        return Ok(());
    }

    let verb = if dry_run { "Would delete" } else { "Deleted" };
    let ids = |ids: &[docver_core::VersionId]| {
        ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
    };

    if !report.removed.is_empty() {
        println!("{} versions:    {}", verb, ids(&report.removed).yellow());
    }
    if !report.dangling_records.is_empty() {
        println!("{} records:     {}", verb, ids(&report.dangling_records).yellow());
    }
    for path in &report.orphaned_files {
        println!("{} orphan:      {}", verb, path.display());
    }
    println!();
    println!("Space freed:         {}", util::format_size(report.bytes_freed).green());

    Ok(())
}
