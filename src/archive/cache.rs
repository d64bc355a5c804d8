// src/archive/cache.rs

//! On-disk download cache
//!
//! A flat directory of previously fetched upstream files. The file name of
//! a URL is its host and path with every `/` replaced by `_`, which is
//! deterministic and collision-free within one archive. The mangling has to
//! stay stable because the orchestrator re-derives the
//! (suite, pocket, component, architecture) tuple of a package index from
//! its cache file name.

use crate::debian::IndexLocation;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Flat directory of cached upstream files
#[derive(Debug, Clone)]
pub struct IndexCache {
    dir: PathBuf,
}

impl IndexCache {
    /// Open (creating if needed) a cache directory.
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| {
            Error::IoError(format!("failed to create cache directory {}: {e}", dir.display()))
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Cache file name for a URL: host + path, with `/` mangled to `_`.
    pub fn file_name_for(url: &Url) -> String {
        format!("{}{}", url.host_str().unwrap_or_default(), url.path()).replace('/', "_")
    }

    /// Absolute path of the cache file for a URL.
    pub fn path_for(&self, url: &Url) -> PathBuf {
        self.dir.join(Self::file_name_for(url))
    }

    /// Absolute path of a cache file by name.
    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

/// Recover the index tuple from a mangled cache file name.
///
/// The right-hand side of the literal `dists_` must be exactly
/// `<suite[-pocket]>_<component>_binary-<arch>_Packages.gz`; suite and
/// pocket split on the first `-`, with the pocket keeping its leading dash.
pub fn parse_index_file_name(name: &str) -> Result<IndexLocation> {
    let halves: Vec<&str> = name.split("dists_").collect();
    if halves.len() != 2 {
        return Err(Error::ParseError(format!("{name} doesn't contain 'dists_'")));
    }

    let parts: Vec<&str> = halves[1].split('_').collect();
    if parts.len() != 4 {
        return Err(Error::ParseError(format!(
            "{} doesn't contain 4 parts",
            halves[1]
        )));
    }

    let suite_pocket = parts[0];
    let component = parts[1];
    let binary_arch = parts[2];

    let (suite, pocket) = match suite_pocket.split_once('-') {
        Some((suite, qualifier)) => (suite.to_string(), format!("-{qualifier}")),
        None => (suite_pocket.to_string(), String::new()),
    };

    let architecture = binary_arch
        .split_once('-')
        .map(|(_, arch)| arch.to_string())
        .ok_or_else(|| {
            Error::ParseError(format!("{binary_arch} is not a binary-<arch> component"))
        })?;

    Ok(IndexLocation {
        suite,
        pocket,
        component: component.to_string(),
        architecture,
    })
}
