// src/service.rs

//! Periodic refresh scheduling
//!
//! One loop drives every configured archive. Archives refresh sequentially
//! within a pass so the store always has a single writer, and a tick that
//! fires while a pass is still running is simply dropped (the interval
//! waits), so two refreshes of the same archive can never overlap.

use crate::archive::Archive;
use crate::db::store::StoreWriter;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Time between refresh passes
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Owns the archives and drives their refresh cycle
pub struct IndexerService {
    archives: Vec<Archive>,
    store: StoreWriter,
}

impl IndexerService {
    pub fn new(archives: Vec<Archive>, store: StoreWriter) -> Self {
        Self { archives, store }
    }

    /// Run refresh passes forever. The first pass is a local one: it
    /// reparses whatever the cache already holds, so a restarted service is
    /// warm before it touches the network.
    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(REFRESH_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut local = true;

        loop {
            interval.tick().await;

            let started = Instant::now();
            self.refresh_all(local).await;
            local = false;

            let elapsed = started.elapsed();
            if elapsed > REFRESH_INTERVAL {
                warn!(
                    "refresh pass took {}s, longer than the {}s interval; skipping missed ticks",
                    elapsed.as_secs(),
                    REFRESH_INTERVAL.as_secs()
                );
            }
        }
    }

    async fn refresh_all(&mut self, local: bool) {
        for archive in &mut self.archives {
            match archive.refresh(local, &self.store).await {
                Ok(stats) => info!(
                    "refreshed {}: {} index files, {} packages",
                    archive.base_url(),
                    stats.index_files,
                    stats.packages
                ),
                Err(err) => error!("refresh failed for {}: {}", archive.base_url(), err),
            }
        }
    }
}
