//! Snapshot, list and inspect versions

use crate::common::TestStore;
use crate::dv;
use anyhow::Result;
use std::fs;

#[test]
fn test_first_snapshots_get_sequential_ids() -> Result<()> {
    let store = TestStore::new();
    store.write("budget.xlsx", vec![1u8; 2048]);

    dv!(store.path(), "init").assert_success()?;

    let first = dv!(store.path(), "snapshot", "budget.xlsx", "-m", "first draft").assert_success()?;
    assert_eq!(first.parse_version_id().as_deref(), Some("v001"));

    store.write("budget.xlsx", vec![2u8; 4096]);
    let second = dv!(store.path(), "snapshot", "budget.xlsx").assert_success()?;
    assert_eq!(second.parse_version_id().as_deref(), Some("v002"));

    assert!(store.metadata_dir().join("v001.meta").exists());
    assert!(store.metadata_dir().join("v002.meta").exists());
    Ok(())
}

#[test]
fn test_snapshot_json_output() -> Result<()> {
    let store = TestStore::new();
    store.write("notes.txt", "quarterly notes");

    let json = dv!(store.path(), "--json", "snapshot", "notes.txt", "-m", "line one\nline two")
        .assert_success()?
        .json()?;

    assert_eq!(json["id"], "v001");
    assert_eq!(json["sizeBytes"], 15);
    assert_eq!(json["notes"], "line one line two");
    let snapshot = json["snapshotPath"].as_str().unwrap_or_default();
    assert_eq!(fs::read_to_string(snapshot)?, "quarterly notes");
    Ok(())
}

#[test]
fn test_log_lists_newest_first() -> Result<()> {
    let store = TestStore::new();
    for i in 0..3 {
        store.write("doc.txt", format!("revision {i}"));
        let notes = format!("rev {i}");
        dv!(store.path(), "snapshot", "doc.txt", "-m", notes.as_str()).assert_success()?;
    }

    let json = dv!(store.path(), "log", "--json").assert_success()?.json()?;
    let ids: Vec<&str> = json
        .as_array()
        .map(|a| a.iter().filter_map(|r| r["id"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(ids, vec!["v003", "v002", "v001"]);

    let limited = dv!(store.path(), "log", "--json", "--limit", "1").assert_success()?.json()?;
    assert_eq!(limited.as_array().map(Vec::len), Some(1));
    assert_eq!(limited[0]["id"], "v003");

    let text = dv!(store.path(), "log").assert_success()?;
    assert!(text.contains_stdout("rev 1"));
    Ok(())
}

#[test]
fn test_log_search_filters() -> Result<()> {
    let store = TestStore::new();
    store.write("doc.txt", "small");
    dv!(store.path(), "snapshot", "doc.txt", "-m", "Quarter close draft").assert_success()?;
    store.write("doc.txt", vec![0u8; 4096]);
    dv!(store.path(), "snapshot", "doc.txt", "-m", "final").assert_success()?;

    let by_notes = dv!(store.path(), "log", "--json", "--notes", "quarter").assert_success()?.json()?;
    assert_eq!(by_notes.as_array().map(Vec::len), Some(1));
    assert_eq!(by_notes[0]["id"], "v001");

    let by_size = dv!(store.path(), "log", "--json", "--min-size", "1024").assert_success()?.json()?;
    assert_eq!(by_size[0]["id"], "v002");

    let future = dv!(store.path(), "log", "--since", "2999-01-01").assert_success()?;
    assert!(future.contains_stdout("No versions match"));

    dv!(store.path(), "log", "--since", "someday").assert_failure()?;
    Ok(())
}

#[test]
fn test_show_and_latest() -> Result<()> {
    let store = TestStore::new();
    store.write("plan.docx", "plan");
    dv!(store.path(), "snapshot", "plan.docx", "-m", "kickoff").assert_success()?;

    let shown = dv!(store.path(), "show", "latest").assert_success()?;
    assert!(shown.contains_stdout("v001"));
    assert!(shown.contains_stdout("kickoff"));

    let json = dv!(store.path(), "show", "1", "--json").assert_success()?.json()?;
    assert_eq!(json["id"], "v001");
    assert!(json["contentHash"].as_str().is_some());

    let missing = dv!(store.path(), "show", "v999").assert_failure()?;
    assert!(missing.contains_stderr("version not found"));
    Ok(())
}

#[test]
fn test_snapshot_of_missing_file_fails() -> Result<()> {
    let store = TestStore::new();

    let result = dv!(store.path(), "snapshot", "nope.xlsx").assert_failure()?;
    assert!(result.contains_stderr("document not found"));

    store.write("real.xlsx", "x");
    let ok = dv!(store.path(), "snapshot", "real.xlsx").assert_success()?;
    assert_eq!(ok.parse_version_id().as_deref(), Some("v001"));
    Ok(())
}

#[test]
fn test_diff_reports_size_delta() -> Result<()> {
    let store = TestStore::new();
    store.write("budget.xlsx", vec![0u8; 20480]);
    dv!(store.path(), "snapshot", "budget.xlsx").assert_success()?;
    store.write("budget.xlsx", vec![0u8; 21504]);

    let json = dv!(store.path(), "diff", "budget.xlsx", "v001", "--json").assert_success()?.json()?;
    assert_eq!(json["sizeDelta"], 1024);
    assert_eq!(json["larger"], "current");
    assert_eq!(json["identical"], false);

    let text = dv!(store.path(), "diff", "budget.xlsx", "v001").assert_success()?;
    assert!(text.contains_stdout("+1.00 KB"));
    Ok(())
}
