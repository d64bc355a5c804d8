// src/archive/tracker.rs

//! Release manifest tracker
//!
//! Remembers the last committed release manifest per pocket, including the
//! SHA-256 of the file it was parsed from. The refresh orchestrator uses it
//! to skip unchanged pockets entirely and to diff the index tables of
//! changed ones. The tracker is in-memory only; after a restart the first
//! refresh sees every pocket as changed and warm-starts from the cache.

use crate::debian::{ReleaseFile, ReleaseFileEntry};
use std::collections::HashMap;

/// Last known release manifest per pocket
#[derive(Debug, Default)]
pub struct ReleaseTracker {
    manifests: HashMap<String, ReleaseFile>,
}

impl ReleaseTracker {
    /// SHA-256 of the last committed manifest for a pocket, if any.
    pub fn hash(&self, pocket: &str) -> Option<&str> {
        self.manifests.get(pocket).map(|m| m.hash.as_str())
    }

    /// Entries of `new` whose hash differs from the committed manifest's
    /// entry at the same path. With no committed manifest, every entry of
    /// `new` is returned.
    pub fn diff(&self, pocket: &str, new: &ReleaseFile) -> Vec<ReleaseFileEntry> {
        let prior = self.manifests.get(pocket);

        new.package_index
            .values()
            .filter(|entry| match prior {
                Some(manifest) => manifest
                    .package_index
                    .get(&entry.path)
                    .map(|prior_entry| prior_entry.hash != entry.hash)
                    .unwrap_or(true),
                None => true,
            })
            .cloned()
            .collect()
    }

    /// Replace the committed manifest for a pocket.
    pub fn commit(&mut self, pocket: &str, manifest: ReleaseFile) {
        self.manifests.insert(pocket.to_string(), manifest);
    }
}
