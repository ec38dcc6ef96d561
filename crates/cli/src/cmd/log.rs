//! List stored versions

use crate::AppContext;
use crate::util;
use anyhow::Result;
use journal::VersionFilter;
use owo_colors::OwoColorize;

pub fn run(ctx: &AppContext, filter: &VersionFilter, limit: Option<usize>) -> Result<()> {
    let vault = ctx.open_vault()?;

    let mut versions = if util::filter_is_empty(filter) {
        vault.list_versions()?
    } else {
        vault.search(filter)?
    };

    // Newest first; the limit keeps the most recent
    versions.reverse();
    if let Some(limit) = limit {
        versions.truncate(limit);
    }

    if ctx.json {
        return util::print_json(&versions);
    }

    if versions.is_empty() {
        if util::filter_is_empty(filter) {
            println!("{}", "No versions yet".dimmed());
            println!("{}", "Tip: Save one with 'dv snapshot <file>'".dimmed());
        } else {
            println!("{}", "No versions match".dimmed());
        }
        return Ok(());
    }

    println!("{}", "Versions".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for record in &versions {
        util::display_version_compact(record);
    }

    Ok(())
}
