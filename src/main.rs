// src/main.rs
//! rmadison-server - archive indexing daemon

use anyhow::{Context, Result};
use clap::Parser;
use rmadison::archive::{Archive, ArchiveClient};
use rmadison::db::store::{PackageStore, StoreWriter};
use rmadison::service::IndexerService;
use rmadison::{db, server, Config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rmadison-server")]
#[command(version)]
#[command(about = "Debian archive metadata indexer and lookup service", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the standard search path)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.clone())),
        )
        .init();

    db::init(&config.database).context("failed to initialize package database")?;
    let store = PackageStore::open(&config.database).context("failed to open package store")?;
    let writer = StoreWriter::spawn(store);

    let client = ArchiveClient::new().context("failed to create HTTP client")?;
    let archives = config
        .archives
        .iter()
        .map(|archive| Archive::new(archive, &config.cache_directory, client.clone()))
        .collect::<rmadison::Result<Vec<_>>>()
        .context("failed to configure archives")?;

    tokio::spawn(IndexerService::new(archives, writer).run());

    server::serve(&config.listen, config.database.clone())
        .await
        .context("http server failed")?;

    Ok(())
}
