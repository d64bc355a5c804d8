// src/archive/client.rs

//! Retrying HTTP downloader
//!
//! A thin wrapper around a shared reqwest client. Bodies stream to a
//! temporary file next to the destination and are renamed into place, so a
//! cache file is always either the previous version or a complete new one.

use crate::error::{Error, Result};
use std::path::Path;
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::warn;
use url::Url;

/// Request timeout for a single attempt
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum attempts per download
const MAX_RETRIES: u32 = 3;

/// Wait before the first retry; doubled per attempt up to [`RETRY_MAX_WAIT`]
const RETRY_INITIAL_WAIT: Duration = Duration::from_secs(5);

/// Ceiling on the retry wait
const RETRY_MAX_WAIT: Duration = Duration::from_secs(20);

/// Shared HTTP client with retry support, safe for concurrent use
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    client: reqwest::Client,
    max_retries: u32,
}

impl ArchiveClient {
    /// Create a client shared by every fetch task of the process.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::InitError(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
        })
    }

    /// Download a URL to the given path, retrying transport errors and 5xx
    /// responses with exponential backoff. Other non-2xx statuses fail
    /// immediately.
    pub async fn download_file(&self, url: &Url, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::IoError(format!("failed to create directory {}: {e}", parent.display()))
            })?;
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return write_body(response, url, dest).await;
                    }
                    if !status.is_server_error() || attempt >= self.max_retries {
                        return Err(Error::DownloadError(format!("HTTP {status} from {url}")));
                    }
                    warn!(
                        "download attempt {} for {} failed: HTTP {}, retrying...",
                        attempt, url, status
                    );
                }
                Err(err) => {
                    if attempt >= self.max_retries {
                        return Err(Error::DownloadError(format!(
                            "failed to fetch {url} after {attempt} attempts: {err}"
                        )));
                    }
                    warn!("download attempt {} for {} failed: {}, retrying...", attempt, url, err);
                }
            }
            tokio::time::sleep(retry_wait(attempt)).await;
        }
    }
}

/// Stream a response body to `<dest>.tmp`, then rename into place.
async fn write_body(mut response: reqwest::Response, url: &Url, dest: &Path) -> Result<()> {
    let temp_path = dest.with_extension("tmp");
    let mut file = File::create(&temp_path).await.map_err(|e| {
        Error::IoError(format!("failed to create file {}: {e}", temp_path.display()))
    })?;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| Error::DownloadError(format!("failed to read response from {url}: {e}")))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::IoError(format!("failed to write downloaded data: {e}")))?;
    }

    file.flush()
        .await
        .map_err(|e| Error::IoError(format!("failed to flush downloaded data: {e}")))?;
    drop(file);

    fs::rename(&temp_path, dest).await.map_err(|e| {
        Error::IoError(format!(
            "failed to move {} to {}: {e}",
            temp_path.display(),
            dest.display()
        ))
    })?;

    Ok(())
}

fn retry_wait(attempt: u32) -> Duration {
    let wait = RETRY_INITIAL_WAIT * 2u32.saturating_pow(attempt - 1);
    wait.min(RETRY_MAX_WAIT)
}
