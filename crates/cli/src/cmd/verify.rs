//! Check store integrity

use crate::AppContext;
use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;

pub fn run(ctx: &AppContext, deep: bool) -> Result<()> {
    let vault = ctx.open_vault()?;
    let report = vault.verify(deep)?;

    if ctx.json {
        util::print_json(&report)?;
    } else {
        println!("{}", "Verifying version store...".bold());
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("Records checked: {}", report.checked);
        if !deep {
            println!("{}", "Sizes only; use --deep to re-hash contents".dimmed());
        }
        println!();

        for record in &report.missing {
            println!(
                "{} {} snapshot missing: {}",
                "✗".red(),
                record.id.to_string().yellow(),
                record.snapshot_path.display()
            );
        }
        for id in &report.modified {
            println!("{} {} snapshot modified after creation", "✗".red(), id.to_string().yellow());
        }
        for warning in &report.malformed {
            println!("{} {}: {}", "✗".red(), warning.path.display(), warning.reason);
        }
        for path in &report.orphaned {
            println!("{} orphaned snapshot file: {}", "!".yellow(), path.display());
        }

        if report.is_clean() {
            println!("{}", "Store is consistent".green());
        }
    }

    if !report.is_clean() {
        let problems = report.missing.len()
            + report.modified.len()
            + report.malformed.len()
            + report.orphaned.len();
        anyhow::bail!("Found {} problem(s) in the version store", problems);
    }
    Ok(())
}
