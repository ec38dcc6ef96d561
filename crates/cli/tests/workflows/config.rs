//! Configuration file management

use crate::common::TestStore;
use crate::dv;
use anyhow::Result;

#[test]
fn test_config_set_get_round_trip() -> Result<()> {
    let store = TestStore::new();

    let path = dv!(store.path(), "config", "path").assert_success()?;
    assert!(path.contains_stdout("docver.toml"));
    assert!(path.contains_stdout("does not exist"));

    dv!(store.path(), "config", "set", "provenance.author", "analyst").assert_success()?;
    dv!(store.path(), "config", "set", "store.id_width", "4").assert_success()?;

    let author = dv!(store.path(), "config", "get", "provenance.author").assert_success()?;
    assert_eq!(author.stdout.trim(), "analyst");
    assert!(store.path().join("docver.toml").exists());

    // New settings apply to snapshots
    store.write("doc.txt", "x");
    let json = dv!(store.path(), "snapshot", "doc.txt", "--json").assert_success()?.json()?;
    assert_eq!(json["id"], "v0001");
    assert_eq!(json["author"], "analyst");
    Ok(())
}

#[test]
fn test_config_rejects_invalid_values() -> Result<()> {
    let store = TestStore::new();

    dv!(store.path(), "config", "set", "store.id_width", "0").assert_failure()?;
    dv!(store.path(), "config", "set", "log.level", "loud").assert_failure()?;
    dv!(store.path(), "config", "get", "no.such.key").assert_failure()?;
    assert!(!store.path().join("docver.toml").exists());
    Ok(())
}

#[test]
fn test_config_example_and_explicit_path() -> Result<()> {
    let store = TestStore::new();

    let example = dv!(store.path(), "config", "example").assert_success()?;
    assert!(example.contains_stdout("[retention]"));

    dv!(store.path(), "--config", "custom.toml", "config", "path", "--create").assert_success()?;
    assert!(store.path().join("custom.toml").exists());

    let env_path = store.path().join("custom.toml");
    let via_env = dv!(store.path(), "config", "path")
        .env("DOCVER_CONFIG", &env_path.to_string_lossy())
        .assert_success()?;
    assert!(via_env.contains_stdout("custom.toml"));
    Ok(())
}

#[test]
fn test_root_flag_places_store() -> Result<()> {
    let store = TestStore::new();
    store.write("doc.txt", "x");

    dv!(store.path(), "--root", "archive", "snapshot", "doc.txt").assert_success()?;
    assert!(store.path().join("archive/Versions/Metadata/v001.meta").exists());
    assert!(!store.path().join("Versions").exists());
    Ok(())
}
