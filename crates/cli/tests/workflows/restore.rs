//! Restore documents to earlier versions

use crate::common::TestStore;
use crate::dv;
use anyhow::Result;
use std::fs;

#[test]
fn test_restore_with_confirmation_flag() -> Result<()> {
    let store = TestStore::new();
    store.write("budget.xlsx", vec![1u8; 20480]);
    dv!(store.path(), "snapshot", "budget.xlsx", "-m", "baseline").assert_success()?;
    store.write("budget.xlsx", vec![2u8; 21504]);

    let result = dv!(store.path(), "restore", "budget.xlsx", "v001", "-y").assert_success()?;
    assert!(result.contains_stdout("Restored"));
    assert_eq!(store.read("budget.xlsx"), vec![1u8; 20480]);

    // The edited contents survive in the backup
    let backups = store.backups("budget.xlsx");
    assert_eq!(backups.len(), 1);
    assert_eq!(fs::read(&backups[0])?, vec![2u8; 21504]);

    // And the document now matches the version
    let json = dv!(store.path(), "diff", "budget.xlsx", "v001", "--json").assert_success()?.json()?;
    assert_eq!(json["sizeDelta"], 0);
    assert_eq!(json["identical"], true);
    Ok(())
}

#[test]
fn test_restore_prompt_answers() -> Result<()> {
    let store = TestStore::new();
    store.write("doc.txt", "original");
    dv!(store.path(), "snapshot", "doc.txt").assert_success()?;
    store.write("doc.txt", "edited");

    let declined = dv!(store.path(), "restore", "doc.txt", "v001").stdin("n\n").assert_success()?;
    assert!(declined.contains_stdout("cancelled"));
    assert_eq!(store.read("doc.txt"), b"edited");
    assert!(store.backups("doc.txt").is_empty());

    dv!(store.path(), "restore", "doc.txt", "v001").stdin("y\n").assert_success()?;
    assert_eq!(store.read("doc.txt"), b"original");
    Ok(())
}

#[test]
fn test_restore_unknown_version_leaves_document() -> Result<()> {
    let store = TestStore::new();
    store.write("doc.txt", "original");
    dv!(store.path(), "snapshot", "doc.txt").assert_success()?;
    store.write("doc.txt", "current work");

    let result = dv!(store.path(), "restore", "doc.txt", "v999", "-y").assert_failure()?;
    assert!(result.contains_stderr("version not found"));
    assert_eq!(store.read("doc.txt"), b"current work");
    assert!(store.backups("doc.txt").is_empty());
    Ok(())
}

#[test]
fn test_restore_refuses_tampered_snapshot() -> Result<()> {
    let store = TestStore::new();
    store.write("doc.txt", "original");
    let json = dv!(store.path(), "snapshot", "doc.txt", "--json").assert_success()?.json()?;
    let snapshot = json["snapshotPath"].as_str().unwrap_or_default().to_string();
    fs::write(&snapshot, "tampered")?;
    store.write("doc.txt", "current work");

    let result = dv!(store.path(), "restore", "doc.txt", "v001", "-y").assert_failure()?;
    assert!(result.contains_stderr("modified after creation"));
    assert_eq!(store.read("doc.txt"), b"current work");
    Ok(())
}

#[test]
fn test_repeated_restores_keep_every_backup() -> Result<()> {
    let store = TestStore::new();
    store.write("doc.txt", "v1 contents");
    dv!(store.path(), "snapshot", "doc.txt").assert_success()?;

    for i in 0..3 {
        store.write("doc.txt", format!("edit {i}"));
        dv!(store.path(), "restore", "doc.txt", "latest", "-y").assert_success()?;
    }

    let backups = store.backups("doc.txt");
    assert_eq!(backups.len(), 3);
    let mut contents: Vec<String> = backups
        .iter()
        .map(fs::read_to_string)
        .collect::<std::io::Result<_>>()?;
    contents.sort();
    assert_eq!(contents, vec!["edit 0", "edit 1", "edit 2"]);

    // Restoring never creates versions
    let log = dv!(store.path(), "log", "--json").assert_success()?.json()?;
    assert_eq!(log.as_array().map(Vec::len), Some(1));
    Ok(())
}
