// src/server/mod.rs

//! Lookup HTTP server
//!
//! A thin read-only endpoint over the package store: `GET /<package>`
//! answers with the JSON records for that name. The server shares nothing
//! with the refresh engine but the database file; handlers open their own
//! read-only connections, which WAL journaling keeps safe during batch
//! commits.

mod handlers;
mod routes;

pub use routes::create_router;

use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing::info;

/// Shared state for the lookup handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// Path of the package database; each handler opens its own connection
    pub db_path: PathBuf,
}

/// Bind and serve the lookup endpoint until the process exits.
pub async fn serve(addr: &str, db_path: PathBuf) -> Result<()> {
    let app = create_router(AppState { db_path });

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::InitError(format!("failed to bind {addr}: {e}")))?;

    info!("starting http server on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::IoError(format!("http server failed: {e}")))
}
