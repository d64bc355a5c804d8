// src/debian/mod.rs

//! Debian archive metadata types
//!
//! Data model for the two control-file formats the indexer consumes:
//! release files ([`ReleaseFile`]) and binary package indices
//! ([`PackageInfo`]).

mod packages;
mod release;

pub use packages::parse_package_index;
pub use release::{ReleaseFile, ReleaseFileEntry};

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static MAINTAINER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*) <(.*)>$").unwrap());

/// The (suite, pocket, component, architecture) tuple identifying one
/// package index within an archive.
///
/// Re-derived from cache file names, see [`crate::archive::cache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLocation {
    pub suite: String,
    /// `"-updates"`, `"-proposed"`, ... or the empty string for the release pocket
    pub pocket: String,
    pub component: String,
    pub architecture: String,
}

/// A package maintainer, split from the `Name <email>` control-file form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMaintainer {
    pub name: String,
    pub email: String,
}

/// Metadata for one binary package publication.
///
/// The six fields (name, component, suite, pocket, architecture,
/// archive_url) identify a publication; everything else is payload from the
/// Packages index. Two records with the same identity replace each other in
/// the store, last write wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    pub component: String,
    pub suite: String,
    pub pocket: String,
    pub architecture: String,
    pub source: String,
    pub section: String,
    pub maintainer: Option<PackageMaintainer>,
    pub sha256: String,
    pub size: i64,
    #[serde(rename = "installed-size")]
    pub installed_size: i64,
    #[serde(rename = "filename")]
    pub file_name: String,
    pub depends: Vec<String>,
    #[serde(rename = "pre-depends")]
    pub pre_depends: Vec<String>,
    pub replaces: Vec<String>,
    pub conflicts: Vec<String>,
    pub suggests: Vec<String>,
    pub description: String,
    pub archive_url: String,
}

impl PackageInfo {
    /// Create a record for a package published in the given index.
    pub fn new(name: &str, location: &IndexLocation, archive_url: &str) -> Self {
        Self {
            name: name.to_string(),
            version: String::new(),
            component: location.component.clone(),
            suite: location.suite.clone(),
            pocket: location.pocket.clone(),
            architecture: location.architecture.clone(),
            source: String::new(),
            section: String::new(),
            maintainer: None,
            sha256: String::new(),
            size: 0,
            installed_size: 0,
            file_name: String::new(),
            depends: Vec::new(),
            pre_depends: Vec::new(),
            replaces: Vec::new(),
            conflicts: Vec::new(),
            suggests: Vec::new(),
            description: String::new(),
            archive_url: archive_url.to_string(),
        }
    }

    /// Assign one control-file field. Unknown keys are ignored; numeric
    /// fields that fail to parse are left zero. Only a malformed
    /// `Maintainer` value reports an error, and that error is recoverable
    /// (the record stays valid with no maintainer).
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "Version" => self.version = value.to_string(),
            "Source" => self.source = value.to_string(),
            "Section" => self.section = value.to_string(),
            "Size" => self.size = value.parse().unwrap_or_default(),
            "Installed-Size" => self.installed_size = value.parse().unwrap_or_default(),
            "SHA256" => self.sha256 = value.to_string(),
            "Description" => self.description = value.to_string(),
            "Filename" => self.file_name = value.to_string(),
            "Depends" => self.depends = split_list(value),
            "Pre-Depends" => self.pre_depends = split_list(value),
            "Replaces" => self.replaces = split_list(value),
            "Conflicts" => self.conflicts = split_list(value),
            "Suggests" => self.suggests = split_list(value),
            "Maintainer" => {
                let captures = MAINTAINER_RE.captures(value).ok_or_else(|| {
                    Error::ParseError(format!("unable to read maintainer info {value}"))
                })?;
                self.maintainer = Some(PackageMaintainer {
                    name: captures[1].to_string(),
                    email: captures[2].to_string(),
                });
            }
            _ => {}
        }

        Ok(())
    }
}

/// Split a comma-separated control-file list field.
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value.split(", ").map(str::to_string).collect()
}
