// src/lib.rs

//! rmadison - Debian archive metadata indexer
//!
//! A long-running service that mirrors the package metadata of Debian-style
//! archives into a local SQLite store and answers "which version is where?"
//! lookups over HTTP, the way the `rmadison` tool does.
//!
//! # Architecture
//!
//! - [`archive`]: the mirroring engine - release-file tracking, hash-driven
//!   incremental refresh, parallel index fetching through an on-disk cache
//! - [`debian`]: parsers and types for the two control-file formats
//! - [`db`]: the SQLite store with its batched persist worker
//! - [`server`]: the read-only lookup endpoint
//! - [`service`]: the periodic refresh loop tying it together
//!
//! `InRelease` signatures are deliberately not verified (the PGP envelope
//! is skipped during parsing); deployments that need authenticated metadata
//! must front the service with a verifying proxy.

pub mod archive;
pub mod config;
pub mod db;
pub mod debian;
mod error;
pub mod server;
pub mod service;

pub use config::{ArchiveConfig, Config};
pub use error::{Error, Result};
