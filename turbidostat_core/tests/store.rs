use std::fs;

use tempfile::tempdir;
use turbidostat_core::store::write_atomic;
use turbidostat_core::{ControllerState, RawReading, StateStore, StoreError};

fn state(z: f64) -> ControllerState {
    ControllerState {
        z,
        blank: RawReading::new(40_000, 30_000),
    }
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));
    assert!(matches!(store.load(), Err(StoreError::NotFound)));
}

#[test]
fn load_after_save_is_identity() {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));
    for s in [state(0.0), state(50.8), state(255.0), state(1.0 / 3.0)] {
        store.save(&s).unwrap();
        assert_eq!(store.load().unwrap(), s);
    }
}

#[test]
fn save_overwrites_and_leaves_no_temp_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    let store = StateStore::new(&path);
    store.save(&state(1.0)).unwrap();
    store.save(&state(2.0)).unwrap();
    assert_eq!(store.load().unwrap().z, 2.0);
    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("state.json")]);
}

#[test]
fn on_disk_format() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    StateStore::new(&path).save(&state(50.8)).unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        r#"{"z":50.8,"blank":[40000,30000]}"#
    );
}

#[test]
fn garbage_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    fs::write(&path, b"{\"z\": 1.0, \"bla").unwrap();
    assert!(matches!(StateStore::new(&path).load(), Err(StoreError::Corrupt(_))));
}

#[test]
fn out_of_range_integral_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    fs::write(&path, r#"{"z":300.0,"blank":[1,1]}"#).unwrap();
    assert!(matches!(StateStore::new(&path).load(), Err(StoreError::Corrupt(_))));
}

#[test]
fn zero_blank_channel_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    let store = StateStore::new(&path);
    for text in [
        r#"{"z":10.0,"blank":[0,0]}"#,
        r#"{"z":10.0,"blank":[40000,0]}"#,
        r#"{"z":10.0,"blank":[0,30000]}"#,
    ] {
        fs::write(&path, text).unwrap();
        assert!(
            matches!(store.load(), Err(StoreError::Corrupt(_))),
            "accepted {text}"
        );
    }
}

#[test]
fn interrupted_write_keeps_previous_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    let store = StateStore::new(&path);
    store.save(&state(12.5)).unwrap();
    // A crash after writing the temp file but before the rename
    fs::write(path.with_extension("new"), b"{\"z\":").unwrap();
    assert_eq!(store.load().unwrap(), state(12.5));
    // The next save replaces the stale temp file
    store.save(&state(13.0)).unwrap();
    assert_eq!(store.load().unwrap(), state(13.0));
}

#[test]
fn unwritable_location_fails_after_retries() {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path().join("missing").join("state.json"));
    let err = store.save_with_retry(&state(1.0), 3).expect_err("no parent dir");
    assert!(matches!(err, StoreError::Io(_)));
}

#[test]
fn write_atomic_creates_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("blob.bin");
    write_atomic(&path, b"abc").unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"abc");
}
