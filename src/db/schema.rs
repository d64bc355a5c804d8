// src/db/schema.rs

//! Database schema definitions and migrations
//!
//! Defines the SQLite schema for the package store and a small migration
//! system to evolve it over time.

use crate::error::Result;
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

fn init_schema_version(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    init_schema_version(conn)?;

    let version = conn
        .query_row(
            "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Apply all pending migrations to bring the database up to date
pub fn migrate(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    debug!("Current schema version: {}", current_version);

    if current_version >= SCHEMA_VERSION {
        debug!("Schema is up to date");
        return Ok(());
    }

    for version in (current_version + 1)..=SCHEMA_VERSION {
        info!("Applying migration to version {}", version);
        apply_migration(conn, version)?;
        set_schema_version(conn, version)?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        1 => migrate_v1(conn),
        _ => panic!("Unknown migration version: {}", version),
    }
}

/// Initial schema - Version 1
///
/// One row per binary package publication. The primary key is the identity
/// tuple of a publication; a later insert with the same identity replaces
/// the row.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE packages (
            name TEXT NOT NULL,
            version TEXT NOT NULL,
            component TEXT NOT NULL,
            suite TEXT NOT NULL,
            pocket TEXT NOT NULL,
            architecture TEXT NOT NULL,
            source TEXT NULL,
            section TEXT NULL,
            maintainer_name TEXT NULL,
            maintainer_email TEXT NULL,
            sha256 TEXT NOT NULL,
            size INTEGER NOT NULL,
            installed_size INTEGER NOT NULL,
            file_name TEXT NOT NULL,
            depends TEXT NULL,
            pre_depends TEXT NULL,
            replaces TEXT NULL,
            conflicts TEXT NULL,
            suggests TEXT NULL,
            description TEXT NULL,
            archive_url TEXT NOT NULL,
            PRIMARY KEY (name, component, suite, pocket, architecture, archive_url)
        );

        CREATE INDEX idx_name ON packages (name);
        ",
    )?;

    Ok(())
}
