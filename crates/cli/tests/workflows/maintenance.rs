//! Status, verify and garbage collection

use crate::common::TestStore;
use crate::dv;
use anyhow::Result;
use std::fs;

fn snapshot_revisions(store: &TestStore, count: usize) -> Result<()> {
    for i in 0..count {
        store.write("doc.txt", format!("revision {i}"));
        dv!(store.path(), "snapshot", "doc.txt").assert_success()?;
    }
    Ok(())
}

#[test]
fn test_status_on_empty_and_populated_store() -> Result<()> {
    let store = TestStore::new();

    let empty = dv!(store.path(), "status").assert_success()?;
    assert!(empty.contains_stdout("not initialized"));
    assert!(empty.contains_stdout("No versions yet"));

    snapshot_revisions(&store, 2)?;
    let json = dv!(store.path(), "status", "--json").assert_success()?.json()?;
    assert_eq!(json["initialized"], true);
    assert_eq!(json["stats"]["totalVersions"], 2);
    assert_eq!(json["stats"]["totalSizeBytes"], 20);
    assert_eq!(json["stats"]["latestVersion"], "v002");
    assert_eq!(json["stats"]["nextOrdinal"], 3);
    Ok(())
}

#[test]
fn test_verify_reports_problems() -> Result<()> {
    let store = TestStore::new();
    snapshot_revisions(&store, 2)?;

    dv!(store.path(), "verify", "--deep").assert_success()?;

    let first = dv!(store.path(), "show", "v001", "--json").assert_success()?.json()?;
    fs::remove_file(first["snapshotPath"].as_str().unwrap_or_default())?;
    store.write("Versions/v050_stray.txt", "stray");

    let result = dv!(store.path(), "verify", "--json").assert_failure()?;
    let json = result.json()?;
    assert_eq!(json["missing"][0]["id"], "v001");
    assert_eq!(json["orphaned"].as_array().map(Vec::len), Some(1));
    assert!(result.contains_stderr("problem"));
    Ok(())
}

#[test]
fn test_gc_keeps_newest() -> Result<()> {
    let store = TestStore::new();
    snapshot_revisions(&store, 5)?;

    let dry = dv!(store.path(), "gc", "--keep", "2", "--dry-run", "--json").assert_success()?.json()?;
    assert_eq!(dry["removed"].as_array().map(Vec::len), Some(3));
    let log = dv!(store.path(), "log", "--json").assert_success()?.json()?;
    assert_eq!(log.as_array().map(Vec::len), Some(5));

    let text = dv!(store.path(), "gc", "--keep", "2").assert_success()?;
    assert!(text.contains_stdout("GC Complete"));

    let log = dv!(store.path(), "log", "--json").assert_success()?.json()?;
    let ids: Vec<&str> = log
        .as_array()
        .map(|a| a.iter().filter_map(|r| r["id"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(ids, vec!["v005", "v004"]);

    // Ids are never reused after pruning
    store.write("doc.txt", "after gc");
    let next = dv!(store.path(), "snapshot", "doc.txt").assert_success()?;
    assert_eq!(next.parse_version_id().as_deref(), Some("v006"));
    Ok(())
}

#[test]
fn test_gc_uses_configured_retention() -> Result<()> {
    let store = TestStore::new();
    store.write("docver.toml", "[retention]\nmax_versions = 1\n");
    snapshot_revisions(&store, 3)?;

    dv!(store.path(), "gc").assert_success()?;
    let log = dv!(store.path(), "log", "--json").assert_success()?.json()?;
    assert_eq!(log.as_array().map(Vec::len), Some(1));
    assert_eq!(log[0]["id"], "v003");
    Ok(())
}

#[test]
fn test_daily_log_file_is_written() -> Result<()> {
    let store = TestStore::new();
    dv!(store.path(), "init").assert_success()?;
    snapshot_revisions(&store, 1)?;

    let logs: Vec<_> = fs::read_dir(store.path().join("Versions/logs"))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("docver.log"))
        .collect();
    assert!(!logs.is_empty());
    Ok(())
}
