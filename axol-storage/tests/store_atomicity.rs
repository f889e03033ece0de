//! Integration tests for the storage engine: persistence across re-opens, and the
//! atomicity guarantee a feed's crawl loop depends on (a rejected `insert` call leaves
//! the database exactly as it was).

use axol_storage::{OpenMode, RawRecord, Store, StoreError, Uid};
use tempfile::tempdir;

fn row(uid: &str) -> (Uid, RawRecord) {
    (Uid::new(uid).unwrap(), RawRecord::from(format!("item {uid}")))
}

#[test]
fn insert_then_reopen_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("f.sqlite");
    {
        let store = Store::open(&path, OpenMode::Writable).unwrap();
        store.insert(vec![row("a"), row("b")], false).unwrap();
    }
    let store = Store::open(&path, OpenMode::Writable).unwrap();
    let rows = store.select_all().unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn dry_run_never_persists() {
    let dir = tempdir().unwrap();
    let store = Store::open(&dir.path().join("f.sqlite"), OpenMode::Writable).unwrap();
    let inserted = store.insert(vec![row("a"), row("b")], true).unwrap();
    assert_eq!(inserted.len(), 2, "dry run still reports the would-be-inserted rows");
    assert!(store.select_all().unwrap().is_empty());
}

/// A batch carrying the same uid twice is a caller contract violation. `insert` must
/// reject the whole call before writing anything — not commit the rows that preceded
/// the duplicate and merely skip the duplicate itself.
#[test]
fn duplicate_uid_in_batch_aborts_before_any_write() {
    let dir = tempdir().unwrap();
    let store = Store::open(&dir.path().join("f.sqlite"), OpenMode::Writable).unwrap();
    store.insert(vec![row("existing")], false).unwrap();

    let batch = vec![
        row("fresh-1"),
        row("fresh-2"),
        row("existing-dup"),
        row("existing-dup"),
    ];
    let err = store.insert(batch, false).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateUidInBatch(ref u) if u == "existing-dup"));

    let rows = store.select_all().unwrap();
    assert_eq!(rows.len(), 1, "fresh-1/fresh-2 must not have been written either");
    assert_eq!(rows[0].1.as_str(), "existing");
}

/// A second `insert` call failing must not disturb rows a prior, successful call wrote.
#[test]
fn failed_insert_preserves_rows_from_an_earlier_successful_call() {
    let dir = tempdir().unwrap();
    let store = Store::open(&dir.path().join("f.sqlite"), OpenMode::Writable).unwrap();
    let first: Vec<_> = (0..10).map(|i| row(&format!("a{i}"))).collect();
    store.insert(first, false).unwrap();
    assert_eq!(store.select_all().unwrap().len(), 10);

    let failing_batch = vec![row("b0"), row("b1"), row("dup"), row("dup")];
    assert!(store.insert(failing_batch, false).is_err());

    let rows = store.select_all().unwrap();
    assert_eq!(rows.len(), 10, "the earlier successful insert must be untouched");
}
