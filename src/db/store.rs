// src/db/store.rs

//! Batched package persistence
//!
//! [`PackageStore`] wraps the write connection and groups inserts into
//! transactions of up to [`BATCH_SIZE`] records. [`StoreWriter`] is the
//! clonable handle the refresh tasks talk to: records travel over a bounded
//! channel to a single worker task that owns the store, giving the
//! fetch/parse producers natural backpressure when SQLite is the slow side.

use crate::db::models;
use crate::debian::PackageInfo;
use crate::error::{Error, Result};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, error};

/// Records per transaction
const BATCH_SIZE: u32 = 10_000;

/// A batch is committed after this long without new records
const FORCE_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Capacity of the record channel feeding the worker
const RECORD_QUEUE_CAPACITY: usize = 1_000;

/// Write connection with transaction batching.
///
/// Owned by exactly one task; concurrency is provided by [`StoreWriter`].
pub struct PackageStore {
    conn: Connection,
    in_tx: bool,
    pending: u32,
}

impl PackageStore {
    /// Open the store for writing. The schema must already be migrated.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = crate::db::open(path)?;
        Ok(Self {
            conn,
            in_tx: false,
            pending: 0,
        })
    }

    /// Insert or replace one record inside the current batch, starting a
    /// new transaction when none is open and committing once the batch is
    /// full. A failed insert rolls back the whole batch; the records lost
    /// with it reappear on the next refresh cycle.
    pub fn upsert(&mut self, pkg: &PackageInfo) -> Result<()> {
        if !self.in_tx {
            self.conn.execute_batch("BEGIN")?;
            self.in_tx = true;
        }

        if let Err(err) = models::insert_package(&self.conn, pkg) {
            self.rollback();
            return Err(err);
        }

        self.pending += 1;
        if self.pending >= BATCH_SIZE {
            self.flush()?;
        }

        Ok(())
    }

    /// Commit the open batch, if any.
    pub fn flush(&mut self) -> Result<()> {
        if !self.in_tx {
            return Ok(());
        }

        debug!("committing batch of {} packages", self.pending);
        self.in_tx = false;
        self.pending = 0;

        if let Err(err) = self.conn.execute_batch("COMMIT") {
            let _ = self.conn.execute_batch("ROLLBACK");
            return Err(err.into());
        }

        Ok(())
    }

    fn rollback(&mut self) {
        self.in_tx = false;
        self.pending = 0;
        if let Err(err) = self.conn.execute_batch("ROLLBACK") {
            error!("rollback failed: {}", err);
        }
    }
}

enum StoreCommand {
    Insert(Box<PackageInfo>),
    /// Flush and reply with the number of records accepted since the last sync
    Sync(oneshot::Sender<u64>),
}

/// Clonable handle to the persist worker
#[derive(Clone)]
pub struct StoreWriter {
    tx: mpsc::Sender<StoreCommand>,
}

impl StoreWriter {
    /// Spawn the persist worker that owns the store for the rest of the
    /// process lifetime.
    pub fn spawn(store: PackageStore) -> Self {
        let (tx, rx) = mpsc::channel(RECORD_QUEUE_CAPACITY);
        tokio::spawn(run_writer(store, rx));
        Self { tx }
    }

    /// Queue one record for insertion.
    pub async fn insert(&self, pkg: PackageInfo) -> Result<()> {
        self.tx
            .send(StoreCommand::Insert(Box::new(pkg)))
            .await
            .map_err(|_| Error::IoError("package store writer is gone".to_string()))
    }

    /// Queue one record from blocking (non-async) code, waiting while the
    /// channel is full.
    pub fn blocking_insert(&self, pkg: PackageInfo) -> Result<()> {
        self.tx
            .blocking_send(StoreCommand::Insert(Box::new(pkg)))
            .map_err(|_| Error::IoError("package store writer is gone".to_string()))
    }

    /// Flush outstanding records and return how many were accepted since
    /// the previous sync. Call only after all producers for the refresh
    /// have completed, so the count is final.
    pub async fn sync(&self) -> Result<u64> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::Sync(reply_tx))
            .await
            .map_err(|_| Error::IoError("package store writer is gone".to_string()))?;
        reply_rx
            .await
            .map_err(|_| Error::IoError("package store writer is gone".to_string()))
    }
}

async fn run_writer(mut store: PackageStore, mut rx: mpsc::Receiver<StoreCommand>) {
    let mut accepted: u64 = 0;

    loop {
        match timeout(FORCE_FLUSH_INTERVAL, rx.recv()).await {
            Ok(Some(StoreCommand::Insert(pkg))) => {
                accepted += 1;
                if let Err(err) = store.upsert(&pkg) {
                    error!("failed to insert package {} in db: {}", pkg.name, err);
                }
                if accepted % u64::from(BATCH_SIZE) == 0 {
                    debug!("inserted {} packages", accepted);
                }
            }
            Ok(Some(StoreCommand::Sync(reply))) => {
                if let Err(err) = store.flush() {
                    error!("transaction failed: {}", err);
                }
                let _ = reply.send(accepted);
                accepted = 0;
            }
            Ok(None) => {
                if let Err(err) = store.flush() {
                    error!("transaction failed: {}", err);
                }
                return;
            }
            // idle: commit whatever is pending so readers see progress
            Err(_) => {
                if let Err(err) = store.flush() {
                    error!("transaction failed: {}", err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::debian::IndexLocation;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, PackageStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packages.db");
        db::init(&path).unwrap();
        let store = PackageStore::open(&path).unwrap();
        (dir, store)
    }

    fn sample(name: &str, version: &str) -> PackageInfo {
        let location = IndexLocation {
            suite: "jammy".to_string(),
            pocket: String::new(),
            component: "main".to_string(),
            architecture: "amd64".to_string(),
        };
        let mut pkg = PackageInfo::new(name, &location, "http://a/ubuntu/dists");
        pkg.version = version.to_string();
        pkg.sha256 = "00".repeat(32);
        pkg
    }

    #[test]
    fn test_upsert_visible_after_flush() {
        let (dir, mut store) = test_store();
        store.upsert(&sample("foo", "1.0")).unwrap();
        store.flush().unwrap();

        let conn = db::open_read_only(&dir.path().join("packages.db")).unwrap();
        assert_eq!(models::find_by_name(&conn, "foo").unwrap().len(), 1);
    }

    #[test]
    fn test_upsert_is_idempotent_per_identity() {
        let (dir, mut store) = test_store();
        store.upsert(&sample("foo", "1.0")).unwrap();
        store.upsert(&sample("foo", "1.1")).unwrap();
        store.flush().unwrap();

        let conn = db::open_read_only(&dir.path().join("packages.db")).unwrap();
        let found = models::find_by_name(&conn, "foo").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].version, "1.1");
    }

    #[test]
    fn test_flush_without_batch_is_noop() {
        let (_dir, mut store) = test_store();
        store.flush().unwrap();
    }

    #[tokio::test]
    async fn test_writer_sync_reports_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packages.db");
        db::init(&path).unwrap();
        let writer = StoreWriter::spawn(PackageStore::open(&path).unwrap());

        writer.insert(sample("foo", "1.0")).await.unwrap();
        writer.insert(sample("bar", "1.0")).await.unwrap();
        assert_eq!(writer.sync().await.unwrap(), 2);

        // the counter resets per sync
        writer.insert(sample("baz", "1.0")).await.unwrap();
        assert_eq!(writer.sync().await.unwrap(), 1);

        let conn = db::open_read_only(&path).unwrap();
        assert_eq!(models::count_packages(&conn).unwrap(), 3);
    }
}
