// src/config.rs

//! Server configuration loading
//!
//! The configuration file is YAML. Unless an explicit path is given, the
//! first existing file among `./server.yaml`, `/etc/rmadison/server` and
//! `$XDG_CONFIG_HOME/rmadison/server.yaml` is used. A missing or invalid
//! configuration is fatal at startup.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration for rmadison-server
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory holding downloaded release files and package indices
    pub cache_directory: PathBuf,

    /// Path to the SQLite package database
    pub database: PathBuf,

    /// Log level filter (overridable with RUST_LOG)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Address the lookup endpoint binds to
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Upstream archives to mirror
    pub archives: Vec<ArchiveConfig>,
}

/// One upstream archive
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    /// Base URL for amd64/i386 indices, e.g. `http://archive.ubuntu.com/ubuntu/dists`
    pub base_url: String,

    /// Base URL for the other architectures; defaults to `base_url`
    #[serde(default)]
    pub ports_url: Option<String>,

    /// Pockets to mirror, e.g. `[jammy, jammy-updates, jammy-proposed]`
    pub pockets: Vec<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_listen() -> String {
    "0.0.0.0:8433".to_string()
}

impl Config {
    /// Load the configuration from an explicit path or the search path.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => Self::find_config_file()?,
        };

        let raw = fs::read_to_string(&path).map_err(|e| {
            Error::InitError(format!("failed to read config {}: {e}", path.display()))
        })?;

        let config: Config = serde_yaml::from_str(&raw).map_err(|e| {
            Error::InitError(format!("invalid config {}: {e}", path.display()))
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Locate the first existing configuration file on the search path.
    fn find_config_file() -> Result<PathBuf> {
        let mut candidates = vec![
            PathBuf::from("./server.yaml"),
            PathBuf::from("/etc/rmadison/server"),
        ];
        if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
            candidates.push(PathBuf::from(xdg).join("rmadison/server.yaml"));
        }

        candidates
            .into_iter()
            .find(|path| path.exists())
            .ok_or_else(|| Error::InitError("no configuration file found".to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.archives.is_empty() {
            return Err(Error::InitError(
                "configuration declares no archives".to_string(),
            ));
        }
        for archive in &self.archives {
            if archive.pockets.is_empty() {
                return Err(Error::InitError(format!(
                    "archive {} declares no pockets",
                    archive.base_url
                )));
            }
        }
        Ok(())
    }
}

impl ArchiveConfig {
    /// URL serving architectures other than amd64/i386.
    pub fn ports_url(&self) -> &str {
        self.ports_url.as_deref().unwrap_or(&self.base_url)
    }
}
