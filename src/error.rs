// src/error.rs

//! Crate-wide error type and Result alias.

use thiserror::Error;

/// Errors produced by the indexer and its lookup store
#[derive(Error, Debug)]
pub enum Error {
    /// Startup/configuration failures (fatal before the service runs)
    #[error("Initialization error: {0}")]
    InitError(String),

    /// HTTP fetch failures, after retries were exhausted
    #[error("Download error: {0}")]
    DownloadError(String),

    /// Malformed release files, package indices, or cache file names
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Filesystem failures on the cache or database paths
    #[error("IO error: {0}")]
    IoError(String),

    /// SQLite errors from the package store
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}

/// Convenience Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
