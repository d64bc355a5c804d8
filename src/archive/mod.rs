// src/archive/mod.rs

//! Archive mirroring engine
//!
//! An [`Archive`] mirrors one upstream Debian-style archive: for every
//! configured pocket it fetches the `InRelease` manifest, diffs its SHA256
//! index table against the last committed manifest, downloads the changed
//! `Packages.gz` indices in parallel, and streams the parsed records to the
//! package store through the batched writer.
//!
//! A refresh pass runs in five phases: release fetch, index selection,
//! parallel fetch + parse, batched persist, manifest commit. Failures stay
//! local to the file or pocket they hit; a pocket's manifest is only
//! committed when every one of its index files was processed, so anything
//! skipped this cycle is retried on the next one.

pub mod cache;
pub mod client;
pub mod tracker;

pub use cache::IndexCache;
pub use client::ArchiveClient;
pub use tracker::ReleaseTracker;

use crate::config::ArchiveConfig;
use crate::db::store::StoreWriter;
use crate::debian::{parse_package_index, ReleaseFile, ReleaseFileEntry};
use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::BufReader;
use std::path::Path;
use tokio::task::JoinSet;
use tracing::{debug, error};
use url::Url;

/// One configured upstream archive and its refresh state
pub struct Archive {
    base_url: Url,
    ports_url: Url,
    /// Identity recorded on every package row of this archive
    archive_url: String,
    pockets: Vec<String>,
    cache: IndexCache,
    client: ArchiveClient,
    tracker: ReleaseTracker,
}

/// Outcome of one refresh pass
#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshStats {
    /// Package indices fetched or reparsed this pass
    pub index_files: usize,
    /// Records handed to the store this pass
    pub packages: u64,
}

impl Archive {
    pub fn new(config: &ArchiveConfig, cache_dir: &Path, client: ArchiveClient) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::InitError(format!("invalid base_url {}: {e}", config.base_url)))?;
        let ports_url = Url::parse(config.ports_url())
            .map_err(|e| Error::InitError(format!("invalid ports_url {}: {e}", config.ports_url())))?;

        Ok(Self {
            base_url,
            ports_url,
            archive_url: config.base_url.clone(),
            pockets: config.pockets.clone(),
            cache: IndexCache::new(cache_dir)?,
            client,
            tracker: ReleaseTracker::default(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Run one refresh pass.
    ///
    /// In local mode cached files take the place of the network where they
    /// exist (missing files are still fetched), and no manifest is
    /// committed to the tracker: a cache-only pass must not claim to be up
    /// to date, the next remote refresh reconciles.
    pub async fn refresh(&mut self, local: bool, store: &StoreWriter) -> Result<RefreshStats> {
        let mut staged = self.stage_release_manifests(local).await;
        debug!("[release] finished processing release indexes");

        let mut results: Vec<(String, usize, bool)> = Vec::new();
        let mut tasks = JoinSet::new();

        for (pocket, manifest) in &staged {
            let to_fetch: Vec<ReleaseFileEntry> = self
                .tracker
                .diff(pocket, manifest)
                .into_iter()
                .filter(|entry| is_binary_package_index(&entry.path))
                .collect();

            if to_fetch.is_empty() {
                results.push((pocket.clone(), 0, true));
                continue;
            }

            let ctx = FetchContext {
                client: self.client.clone(),
                cache: self.cache.clone(),
                base_url: self.base_url.clone(),
                ports_url: self.ports_url.clone(),
                archive_url: self.archive_url.clone(),
                local,
                store: store.clone(),
            };
            tasks.spawn(refresh_pocket(ctx, pocket.clone(), to_fetch));
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(err) => error!("pocket refresh task failed: {}", err),
            }
        }

        // all producers are done; flush and collect the final count
        let packages = store.sync().await?;

        let mut index_files = 0;
        for (pocket, nb_files, clean) in results {
            index_files += nb_files;
            debug!("[packages][{}] refreshed", pocket);
            if clean && !local {
                if let Some(manifest) = staged.remove(&pocket) {
                    self.tracker.commit(&pocket, manifest);
                }
            }
        }

        Ok(RefreshStats {
            index_files,
            packages,
        })
    }

    /// Release phase: fetch and parse the `InRelease` file of every pocket,
    /// returning the manifests that changed since the last commit. Failing
    /// pockets are logged and skipped for this cycle.
    async fn stage_release_manifests(&self, local: bool) -> HashMap<String, ReleaseFile> {
        let mut staged = HashMap::new();

        for pocket in &self.pockets {
            match self.fetch_release(pocket, local).await {
                Ok(Some(manifest)) => {
                    staged.insert(pocket.clone(), manifest);
                }
                Ok(None) => {}
                Err(err) => {
                    error!("failed to refresh release file for {}: {}", pocket, err);
                }
            }
        }

        staged
    }

    /// Fetch one pocket's `InRelease` into the cache and parse it; `None`
    /// when the file hash matches the committed manifest.
    async fn fetch_release(&self, pocket: &str, local: bool) -> Result<Option<ReleaseFile>> {
        let url = join_url(&self.base_url, &[pocket, "InRelease"]);
        let path = self.cache.path_for(&url);

        if local && path.exists() {
            debug!("[release] local {}", path.display());
        } else {
            debug!("[release] fetching {}", url);
            self.client.download_file(&url, &path).await?;
        }

        let raw = tokio::fs::read(&path)
            .await
            .map_err(|e| Error::IoError(format!("failed to read {}: {e}", path.display())))?;
        let hash = sha256_hex(&raw);

        if self.tracker.hash(pocket) == Some(hash.as_str()) {
            debug!("[release] nothing to do {}", path.display());
            return Ok(None);
        }

        debug!("[release] parsing {}", path.display());
        let mut manifest = ReleaseFile::parse(&raw[..])?;
        manifest.hash = hash;

        Ok(Some(manifest))
    }
}

/// Everything a fetch task needs, cheap to clone per task
#[derive(Clone)]
struct FetchContext {
    client: ArchiveClient,
    cache: IndexCache,
    base_url: Url,
    ports_url: Url,
    archive_url: String,
    local: bool,
    store: StoreWriter,
}

/// Fetch and parse every changed index of one pocket, one task per file.
/// Returns (pocket, file count, whether every file was processed cleanly).
async fn refresh_pocket(
    ctx: FetchContext,
    pocket: String,
    entries: Vec<ReleaseFileEntry>,
) -> (String, usize, bool) {
    let nb_files = entries.len();
    let mut tasks = JoinSet::new();

    for entry in entries {
        let base = index_base_url(&ctx.base_url, &ctx.ports_url, &entry.path);
        let url = join_url(base, &[&pocket, &entry.path]);
        tasks.spawn(fetch_and_parse(ctx.clone(), url));
    }

    let mut clean = true;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!("[packages][{}] {}", pocket, err);
                clean = false;
            }
            Err(err) => {
                error!("[packages][{}] fetch task failed: {}", pocket, err);
                clean = false;
            }
        }
    }

    (pocket, nb_files, clean)
}

/// Download one `Packages.gz` into the cache (unless a local pass already
/// has it), then gunzip and stream-parse it into the store. The index tuple
/// is re-derived from the cache file name.
async fn fetch_and_parse(ctx: FetchContext, url: Url) -> Result<()> {
    let file_name = IndexCache::file_name_for(&url);
    let path = ctx.cache.path(&file_name);

    if ctx.local && path.exists() {
        debug!("[package] local {}", path.display());
    } else {
        ctx.client.download_file(&url, &path).await?;
        debug!("[package] downloaded {}", path.display());
    }

    let location = cache::parse_index_file_name(&file_name)?;

    let parsed = tokio::task::spawn_blocking(move || -> Result<usize> {
        let file = std::fs::File::open(&path)
            .map_err(|e| Error::IoError(format!("failed to open {}: {e}", path.display())))?;
        let reader = BufReader::new(GzDecoder::new(file));
        parse_package_index(reader, &location, &ctx.archive_url, |pkg| {
            ctx.store.blocking_insert(pkg)
        })
    })
    .await
    .map_err(|e| Error::ParseError(format!("package index parser task failed: {e}")))??;

    debug!("[package] indexed {} records from {}", parsed, file_name);
    Ok(())
}

/// Binary package indices only; debian-installer sub-indices are skipped.
fn is_binary_package_index(path: &str) -> bool {
    path.contains("Packages.gz") && !path.contains("installer")
}

/// amd64 and i386 live on the primary mirror, every other architecture on
/// the ports mirror.
fn index_base_url<'a>(base_url: &'a Url, ports_url: &'a Url, entry_path: &str) -> &'a Url {
    if entry_path.contains("amd64") || entry_path.contains("i386") {
        base_url
    } else {
        ports_url
    }
}

fn join_url(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    let mut path = base.path().trim_end_matches('/').to_string();
    for segment in segments {
        path.push('/');
        path.push_str(segment.trim_matches('/'));
    }
    url.set_path(&path);
    url
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        let base = Url::parse("http://archive.ubuntu.com/ubuntu/dists").unwrap();
        let url = join_url(&base, &["jammy-updates", "InRelease"]);
        assert_eq!(
            url.as_str(),
            "http://archive.ubuntu.com/ubuntu/dists/jammy-updates/InRelease"
        );
    }

    #[test]
    fn test_join_url_tolerates_trailing_slash() {
        let base = Url::parse("http://archive.ubuntu.com/ubuntu/dists/").unwrap();
        let url = join_url(&base, &["jammy", "main/binary-amd64/Packages.gz"]);
        assert_eq!(
            url.as_str(),
            "http://archive.ubuntu.com/ubuntu/dists/jammy/main/binary-amd64/Packages.gz"
        );
    }

    #[test]
    fn test_binary_index_filter() {
        assert!(is_binary_package_index("main/binary-amd64/Packages.gz"));
        assert!(!is_binary_package_index("main/binary-amd64/Packages.xz"));
        assert!(!is_binary_package_index("main/debian-installer/binary-amd64/Packages.gz"));
        assert!(!is_binary_package_index("main/binary-amd64/Release"));
    }

    #[test]
    fn test_primary_and_ports_split() {
        let base = Url::parse("http://archive.ubuntu.com/ubuntu/dists").unwrap();
        let ports = Url::parse("http://ports.ubuntu.com/ubuntu-ports/dists").unwrap();

        assert_eq!(
            index_base_url(&base, &ports, "main/binary-amd64/Packages.gz"),
            &base
        );
        assert_eq!(
            index_base_url(&base, &ports, "main/binary-i386/Packages.gz"),
            &base
        );
        assert_eq!(
            index_base_url(&base, &ports, "main/binary-armhf/Packages.gz"),
            &ports
        );
        assert_eq!(
            index_base_url(&base, &ports, "universe/binary-riscv64/Packages.gz"),
            &ports
        );
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
