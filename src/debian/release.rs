// src/debian/release.rs

//! Release/InRelease file parsing
//!
//! A release file is a block of `Key: Value` headers followed by checksum
//! tables listing the index files of the pocket. Only the SHA256 table is
//! read. `InRelease` files are PGP-clear-signed; the signature envelope is
//! skipped, not verified.

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;
use std::io::BufRead;

/// One entry of the SHA256 index table of a release file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseFileEntry {
    /// Hex SHA-256 of the index file
    pub hash: String,
    /// Size in bytes
    pub size: u64,
    /// Path relative to the pocket, e.g. `main/binary-amd64/Packages.gz`
    pub path: String,
}

/// A parsed release file for one pocket
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReleaseFile {
    pub origin: String,
    pub label: String,
    pub suite: String,
    pub version: String,
    pub codename: String,
    /// None when the Date header is absent or not RFC 1123 with numeric zone
    pub date: Option<DateTime<FixedOffset>>,
    pub architectures: Vec<String>,
    pub components: Vec<String>,
    pub description: String,
    /// Index-file entries keyed by their relative path
    pub package_index: HashMap<String, ReleaseFileEntry>,
    /// Hex SHA-256 of the bytes this manifest was parsed from; filled in by
    /// the caller, compared across refreshes to skip unchanged pockets
    pub hash: String,
}

impl ReleaseFile {
    /// Parse a release file from a line-oriented reader.
    ///
    /// Parsing is total: unknown headers are ignored, a malformed `Date` is
    /// tolerated, and the index table ends at the first line that is not
    /// three whitespace-separated fields. Only unreadable input is an error.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut release = ReleaseFile::default();
        let mut lines = reader.lines();

        while let Some(line) = lines.next() {
            let line = line
                .map_err(|e| Error::ParseError(format!("failed to read release file: {e}")))?;

            if line.contains("BEGIN PGP SIGNATURE") {
                // signature verification is out of scope; the payload ends here
                break;
            }

            let key_value: Vec<&str> = line.split(": ").collect();
            if key_value.len() == 2 {
                release.set_header(key_value[0], key_value[1]);
            }

            if line.starts_with("SHA256") {
                for entry_line in lines.by_ref() {
                    let entry_line = entry_line.map_err(|e| {
                        Error::ParseError(format!("failed to read release file: {e}"))
                    })?;
                    match parse_index_line(&entry_line) {
                        Some(entry) => {
                            release.package_index.insert(entry.path.clone(), entry);
                        }
                        // the first non-matching line ends the table
                        None => break,
                    }
                }
            }
        }

        Ok(release)
    }

    /// Assign one header field; unknown keys are ignored silently.
    fn set_header(&mut self, key: &str, value: &str) {
        match key {
            "Origin" => self.origin = value.to_string(),
            "Label" => self.label = value.to_string(),
            "Suite" => self.suite = value.to_string(),
            "Version" => self.version = value.to_string(),
            "Codename" => self.codename = value.to_string(),
            "Description" => self.description = value.to_string(),
            "Date" => {
                if let Ok(date) = DateTime::parse_from_rfc2822(value) {
                    self.date = Some(date);
                }
            }
            "Architectures" => {
                self.architectures = value.split(' ').map(str::to_string).collect();
            }
            "Components" => {
                self.components = value.split(' ').map(str::to_string).collect();
            }
            _ => {}
        }
    }
}

/// Parse one `<hex-hash> <size> <path>` line of the index table.
fn parse_index_line(line: &str) -> Option<ReleaseFileEntry> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 3 {
        return None;
    }

    let size = fields[1].parse().ok()?;

    Some(ReleaseFileEntry {
        hash: fields[0].to_string(),
        size,
        path: fields[2].to_string(),
    })
}
