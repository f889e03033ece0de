use crate::{CrawlTimestamp, RawRecord, Uid};
use parking_lot::Mutex;
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OpenFlags, TransactionBehavior};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("store at {path} does not exist (read-only open requires an existing file)")]
    ReadOnlyMissing { path: PathBuf },
    #[error("uid {0:?} passed twice within a single insert call")]
    DuplicateUidInBatch(String),
}

/// Whether a [`Store`] is opened for writing (creating the table if missing) or for
/// reading an existing feed database without risk of mutating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Writable,
    ReadOnly,
}

/// One feed's SQLite file: a single STRICT `results` table keyed by `uid`, with every
/// write serialized behind `BEGIN IMMEDIATE`. Uses a non-poisoning mutex: a panic from a
/// caller-supplied predicate or input iterator while the lock is held must not brick the
/// store for the rest of the process.
pub struct Store {
    conn: Mutex<Connection>,
    path: PathBuf,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS results (
    crawl_timestamp_utc INTEGER NOT NULL,
    uid                 TEXT    NOT NULL UNIQUE,
    data                BLOB    NOT NULL
) STRICT;
";

impl Store {
    pub fn open(path: &Path, mode: OpenMode) -> Result<Self, StoreError> {
        let conn = match mode {
            OpenMode::Writable => {
                let conn = Connection::open(path)?;
                conn.execute_batch(SCHEMA)?;
                conn
            }
            OpenMode::ReadOnly => {
                if !path.exists() {
                    return Err(StoreError::ReadOnlyMissing {
                        path: path.to_path_buf(),
                    });
                }
                Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?
            }
        };
        Ok(Store {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Inserts the new (not-yet-seen) uids among `rows`, all stamped with one
    /// `CrawlTimestamp` taken at the start of the call. Returns only the rows that were
    /// actually new. A uid repeated within `rows` itself is a caller bug and aborts the
    /// whole call before any write (`DuplicateUidInBatch`); anything already present in
    /// the database is silently skipped.
    pub fn insert(
        &self,
        rows: impl IntoIterator<Item = (Uid, RawRecord)>,
        dry: bool,
    ) -> Result<Vec<(CrawlTimestamp, Uid, RawRecord)>, StoreError> {
        let now = CrawlTimestamp::now();
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: HashSet<String> = {
            let mut stmt = tx.prepare("SELECT uid FROM results")?;
            let mapped = stmt.query_map([], |r| r.get::<_, String>(0))?;
            mapped.collect::<Result<_, rusqlite::Error>>()?
        };

        let mut seen_this_call: HashSet<String> = HashSet::new();
        let mut to_insert = Vec::new();
        for (uid, data) in rows {
            let key = uid.as_str().to_string();
            if !seen_this_call.insert(key.clone()) {
                return Err(StoreError::DuplicateUidInBatch(key));
            }
            if existing.contains(&key) {
                continue;
            }
            to_insert.push((uid, data));
        }

        if !dry {
            for (uid, data) in &to_insert {
                tx.execute(
                    "INSERT INTO results (crawl_timestamp_utc, uid, data) VALUES (?1, ?2, ?3)",
                    params![now.as_secs(), uid.as_str(), data.as_bytes()],
                )?;
            }
            tx.commit()?;
        } else {
            tx.rollback()?;
        }

        tracing::info!(
            path = %self.path.display(),
            new = to_insert.len(),
            dry,
            "insert complete"
        );
        Ok(to_insert
            .into_iter()
            .map(|(uid, data)| (now, uid, data))
            .collect())
    }

    /// All stored rows, ordered by `(crawl_timestamp_utc, uid)`.
    pub fn select_all(&self) -> Result<Vec<(CrawlTimestamp, Uid, RawRecord)>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT crawl_timestamp_utc, uid, data FROM results ORDER BY crawl_timestamp_utc, uid",
        )?;
        let rows = stmt.query_map([], |r| {
            let ts: i64 = r.get(0)?;
            let uid: String = r.get(1)?;
            let data: Vec<u8> = r.get(2)?;
            Ok((ts, uid, data))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (ts, uid, data) = row?;
            let uid = Uid::new(uid).expect("uids are validated before being written");
            out.push((CrawlTimestamp::from_secs(ts), uid, RawRecord::new(data)));
        }
        tracing::info!(path = %self.path.display(), count = out.len(), "select_all");
        Ok(out)
    }

    /// Evaluates `predicate` over every row's `data` inside SQLite (bound as a
    /// user-defined scalar function for the duration of the call) and, unless `dry`,
    /// deletes the matches in the same transaction. Returns the matched rows either way.
    pub fn delete(
        &self,
        dry: bool,
        predicate: impl Fn(&[u8]) -> bool + Send + 'static,
    ) -> Result<Vec<(CrawlTimestamp, Uid, RawRecord)>, StoreError> {
        let conn = self.conn.lock();

        conn.create_scalar_function(
            "axol_predicate",
            1,
            FunctionFlags::SQLITE_UTF8,
            move |ctx| {
                let blob = ctx.get::<Vec<u8>>(0)?;
                Ok(predicate(&blob))
            },
        )?;

        let run = || -> Result<Vec<(i64, String, Vec<u8>)>, StoreError> {
            conn.execute("BEGIN IMMEDIATE", [])?;
            let mut stmt = conn.prepare(
                "SELECT crawl_timestamp_utc, uid, data FROM results WHERE axol_predicate(data)",
            )?;
            let matched: Vec<(i64, String, Vec<u8>)> = stmt
                .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
                .collect::<Result<_, rusqlite::Error>>()?;
            drop(stmt);
            if !dry {
                let deleted =
                    conn.execute("DELETE FROM results WHERE axol_predicate(data)", [])?;
                assert_eq!(
                    deleted,
                    matched.len(),
                    "predicate must be deterministic between select and delete"
                );
            }
            conn.execute("COMMIT", [])?;
            Ok(matched)
        };

        let result = run();
        if result.is_err() {
            let _ = conn.execute("ROLLBACK", []);
        }
        conn.remove_function("axol_predicate", 1)?;
        let matched = result?;

        tracing::info!(
            path = %self.path.display(),
            matched = matched.len(),
            dry,
            "delete"
        );
        Ok(matched
            .into_iter()
            .map(|(ts, uid, data)| {
                (
                    CrawlTimestamp::from_secs(ts),
                    Uid::new(uid).expect("uids are validated before being written"),
                    RawRecord::new(data),
                )
            })
            .collect())
    }
}
