// src/db/mod.rs

//! SQLite package database
//!
//! One `packages` table keyed by the publication identity tuple, with a
//! secondary index on the package name for lookups. The database runs in
//! WAL mode so lookup handlers can read while the persist worker commits
//! batches.

pub mod models;
pub mod schema;
pub mod store;

use crate::error::{Error, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

/// Create the database file if needed and bring the schema up to date.
pub fn init(path: &Path) -> Result<()> {
    let conn = open(path)?;
    schema::migrate(&conn)
}

/// Open a read-write connection with WAL journaling enabled.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    // readers must not block on the batched writer
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    Ok(conn)
}

/// Open a read-only connection for lookup handlers.
pub fn open_read_only(path: &Path) -> Result<Connection> {
    if !path.exists() {
        return Err(Error::IoError(format!(
            "database {} does not exist",
            path.display()
        )));
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    Ok(conn)
}
