//! Restore a document to a stored version

use crate::AppContext;
use crate::util;
use anyhow::{Context, Result};
use docver_core::VersionError;
use owo_colors::OwoColorize;
use std::path::Path;

pub fn run(ctx: &AppContext, file: &Path, version: &str, yes: bool) -> Result<()> {
    let vault = ctx.open_vault()?;

    // 1. Resolve before asking, so typos fail fast
    let record = vault
        .get(version)
        .with_context(|| format!("Failed to resolve version '{}'", version))?;

    // 2. Confirm
    if !yes && !ctx.json {
        println!(
            "Restore {} to {}? The current contents will be kept in a backup file.",
            file.display().to_string().cyan(),
            record.label().yellow()
        );
        if !util::confirm("Continue?")? {
            println!("{}", "Restore cancelled".dimmed());
            return Ok(());
        }
    }

    // 3. Roll back
    let result = match vault.rollback(file, &record.id.to_string()) {
        Ok(result) => result,
        Err(VersionError::RollbackFailed {
            id,
            reason,
            restored,
            backup,
        }) => {
            if restored {
                anyhow::bail!(
                    "Restore to {} failed ({}); {} was left as it was. Backup: {}",
                    id,
                    reason,
                    file.display(),
                    backup.display()
                );
            }
            anyhow::bail!(
                "Restore to {} failed ({}) and {} could not be put back. Recover it from {}",
                id,
                reason,
                file.display(),
                backup.display()
            );
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to restore {}", file.display()));
        }
    };

    if ctx.json {
        return util::print_json(&result);
    }

    println!(
        "{} Restored {} to {}",
        "✓".green(),
        result.document.display(),
        result.version.to_string().yellow().bold()
    );
    println!("  Wrote:    {}", util::format_size(result.bytes_written));
    println!("  Backup:   {}", result.backup_path.display().to_string().dimmed());
    Ok(())
}
