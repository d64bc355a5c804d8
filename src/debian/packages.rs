// src/debian/packages.rs

//! Packages-index parsing
//!
//! A Packages file is a stream of stanzas separated by blank lines. Each
//! stanza describing a binary package starts with a `Package:` line;
//! stanzas without one are dropped. Records are handed to a sink callback
//! in file order, so callers can apply channel backpressure while the
//! stream is still being read.

use crate::debian::{IndexLocation, PackageInfo};
use crate::error::{Error, Result};
use std::io::BufRead;
use tracing::warn;

/// Parse a Packages index, emitting one record per stanza that carries a
/// `Package:` line. Returns the number of records emitted.
///
/// Field-level problems are recoverable: lines without the `": "` delimiter
/// are skipped and a malformed maintainer is logged and dropped. Only
/// unreadable input aborts the stream.
pub fn parse_package_index<R, F>(
    reader: R,
    location: &IndexLocation,
    archive_url: &str,
    mut sink: F,
) -> Result<usize>
where
    R: BufRead,
    F: FnMut(PackageInfo) -> Result<()>,
{
    let mut emitted = 0;
    let mut current: Option<PackageInfo> = None;

    for line in reader.lines() {
        let line =
            line.map_err(|e| Error::ParseError(format!("failed to read package index: {e}")))?;

        if line.is_empty() {
            if let Some(pkg) = current.take() {
                sink(pkg)?;
                emitted += 1;
            }
            continue;
        }

        let Some(delim) = line.find(": ") else {
            // continuation lines and anything else without a "Key: Value" shape
            continue;
        };
        let key = &line[..delim];
        let value = &line[delim + 2..];

        if key == "Package" {
            // a second Package line inside a stanza restarts the record
            current = Some(PackageInfo::new(value, location, archive_url));
            continue;
        }

        if let Some(pkg) = current.as_mut() {
            if let Err(err) = pkg.set_field(key, value) {
                warn!("[package] error reading maintainer info ({}): {}", pkg.name, err);
            }
        }
    }

    if let Some(pkg) = current.take() {
        sink(pkg)?;
        emitted += 1;
    }

    Ok(emitted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> IndexLocation {
        IndexLocation {
            suite: "jammy".to_string(),
            pocket: String::new(),
            component: "main".to_string(),
            architecture: "amd64".to_string(),
        }
    }

    fn collect(input: &str) -> Vec<PackageInfo> {
        let mut packages = Vec::new();
        parse_package_index(input.as_bytes(), &location(), "http://a/ubuntu/dists", |pkg| {
            packages.push(pkg);
            Ok(())
        })
        .unwrap();
        packages
    }

    const TWO_STANZAS: &str = "\
Package: foo
Version: 1.0
Size: 42
SHA256: 00aa
Maintainer: A <a@x>
Filename: pool/main/f/foo.deb

Package: bar
Version: 2.0
Depends: foo (>= 1.0), libc6
Description: a bar package
";

    #[test]
    fn test_one_record_per_stanza() {
        let packages = collect(TWO_STANZAS);
        assert_eq!(packages.len(), 2);

        assert_eq!(packages[0].name, "foo");
        assert_eq!(packages[0].version, "1.0");
        assert_eq!(packages[0].size, 42);
        assert_eq!(packages[0].sha256, "00aa");
        assert_eq!(packages[0].file_name, "pool/main/f/foo.deb");
        assert_eq!(packages[0].maintainer.as_ref().unwrap().name, "A");
        assert_eq!(packages[0].maintainer.as_ref().unwrap().email, "a@x");
        assert_eq!(packages[0].suite, "jammy");
        assert_eq!(packages[0].pocket, "");
        assert_eq!(packages[0].component, "main");
        assert_eq!(packages[0].architecture, "amd64");
        assert_eq!(packages[0].archive_url, "http://a/ubuntu/dists");

        assert_eq!(packages[1].name, "bar");
        assert_eq!(
            packages[1].depends,
            vec!["foo (>= 1.0)".to_string(), "libc6".to_string()]
        );
        assert_eq!(packages[1].description, "a bar package");
    }

    #[test]
    fn test_stanza_without_package_line_dropped() {
        let input = "Version: 1.0\nSize: 42\n\nPackage: kept\nVersion: 2.0\n";
        let packages = collect(input);
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "kept");
    }

    #[test]
    fn test_lines_without_delimiter_skipped() {
        let input = "\
Package: foo
Version: 1.0
 this is a description continuation line
garbage-without-delimiter
Section: web
";
        let packages = collect(input);
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].version, "1.0");
        assert_eq!(packages[0].section, "web");
    }

    #[test]
    fn test_value_keeps_embedded_delimiter() {
        let input = "Package: foo\nDescription: tool: does things\n";
        let packages = collect(input);
        assert_eq!(packages[0].description, "tool: does things");
    }

    #[test]
    fn test_second_package_line_restarts_stanza_record() {
        let input = "Package: first\nVersion: 1.0\nPackage: second\nVersion: 2.0\n";
        let packages = collect(input);
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "second");
        assert_eq!(packages[0].version, "2.0");
    }

    #[test]
    fn test_bad_maintainer_keeps_record() {
        let input = "Package: foo\nMaintainer: nobody-in-particular\nVersion: 1.0\n";
        let packages = collect(input);
        assert_eq!(packages.len(), 1);
        assert!(packages[0].maintainer.is_none());
        assert_eq!(packages[0].version, "1.0");
    }

    #[test]
    fn test_trailing_blank_lines() {
        let input = "Package: foo\nVersion: 1.0\n\n\n\n";
        let packages = collect(input);
        assert_eq!(packages.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(collect("").is_empty());
    }
}
