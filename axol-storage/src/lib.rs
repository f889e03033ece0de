//! Identifier/value types and the per-feed SQLite storage engine.

pub mod raw;
pub mod store;
pub mod time;
pub mod uid;

pub use raw::RawRecord;
pub use store::{OpenMode, Store, StoreError};
pub use time::{CrawlDt, CrawlTimestamp};
pub use uid::{Uid, UidError};

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(uid: &str, text: &str) -> (Uid, RawRecord) {
        (Uid::new(uid).unwrap(), RawRecord::from(text.to_string()))
    }

    #[test]
    fn insert_dedups_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("t.sqlite"), OpenMode::Writable).unwrap();
        let first = store
            .insert(vec![row("a", "1"), row("b", "2")], false)
            .unwrap();
        assert_eq!(first.len(), 2);
        let second = store
            .insert(vec![row("a", "1"), row("b", "2")], false)
            .unwrap();
        assert_eq!(second.len(), 0);
        assert_eq!(store.select_all().unwrap().len(), 2);
    }

    #[test]
    fn insert_rejects_duplicate_uid_in_one_call() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("t.sqlite"), OpenMode::Writable).unwrap();
        let err = store
            .insert(vec![row("a", "1"), row("a", "2")], false)
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUidInBatch(_)));
        assert_eq!(store.select_all().unwrap().len(), 0);
    }

    #[test]
    fn dry_insert_does_not_write() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("t.sqlite"), OpenMode::Writable).unwrap();
        let would_be = store.insert(vec![row("a", "1")], true).unwrap();
        assert_eq!(would_be.len(), 1);
        assert_eq!(store.select_all().unwrap().len(), 0);
    }

    #[test]
    fn select_all_orders_by_timestamp_then_uid() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("t.sqlite"), OpenMode::Writable).unwrap();
        store.insert(vec![row("b", "1"), row("a", "2")], false).unwrap();
        let rows = store.select_all().unwrap();
        assert_eq!(rows[0].1.as_str(), "a");
        assert_eq!(rows[1].1.as_str(), "b");
    }

    #[test]
    fn delete_dry_run_reports_without_mutating() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("t.sqlite"), OpenMode::Writable).unwrap();
        store
            .insert(
                vec![row("a", "keep"), row("b", "drop-me"), row("c", "keep")],
                false,
            )
            .unwrap();
        let matched = store
            .delete(true, |data| {
                std::str::from_utf8(data).unwrap_or("").contains("drop")
            })
            .unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(store.select_all().unwrap().len(), 3);

        let real = store
            .delete(false, |data| {
                std::str::from_utf8(data).unwrap_or("").contains("drop")
            })
            .unwrap();
        assert_eq!(real.len(), 1);
        assert_eq!(store.select_all().unwrap().len(), 2);
    }

    #[test]
    fn read_only_open_requires_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.sqlite");
        let err = Store::open(&path, OpenMode::ReadOnly).unwrap_err();
        assert!(matches!(err, StoreError::ReadOnlyMissing { .. }));
    }
}
