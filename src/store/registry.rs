//! Pyramid registry: listing and deletion.
//!
//! Listing is a deliberate directory scan, an index rebuild from the
//! filesystem rather than a read of hidden in-memory state. Only published
//! pyramids (descriptor present) appear; orphaned tile trees from failed
//! builds are invisible.

use std::cmp::Ordering;
use std::fs;
use std::io;

use super::{CacheKey, ImageMetadata, TileStore};

/// One published pyramid found by a registry scan.
#[derive(Debug, Clone)]
pub struct PyramidEntry {
    /// The pyramid's cache key
    pub key: CacheKey,

    /// Metadata record, default if missing or unreadable
    pub meta: ImageMetadata,
}

impl TileStore {
    /// List all published pyramids, newest first.
    ///
    /// Orders by `processed_at` descending; entries whose metadata is
    /// missing or has no timestamp sort last.
    pub fn list_pyramids(&self) -> io::Result<Vec<PyramidEntry>> {
        let mut entries = Vec::new();

        for dir_entry in fs::read_dir(self.root())? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("dzi") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let key = CacheKey::from_normalized(stem.to_string());
            let meta = self.load_metadata(&key);
            entries.push(PyramidEntry { key, meta });
        }

        entries.sort_by(|a, b| {
            match (a.meta.processed_at.is_empty(), b.meta.processed_at.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => b.meta.processed_at.cmp(&a.meta.processed_at),
            }
        });

        Ok(entries)
    }

    /// Remove a pyramid's descriptor, metadata, and tile tree.
    ///
    /// Best-effort composite: each piece is removed independently. Returns
    /// whether anything was actually removed, so an absent key reads as
    /// "not found" rather than an error.
    ///
    /// The descriptor goes first, unpublishing the pyramid before the tile
    /// tree disappears underneath readers.
    pub fn remove_pyramid(&self, key: &CacheKey) -> bool {
        let mut removed = false;

        if fs::remove_file(self.descriptor_path(key)).is_ok() {
            removed = true;
        }
        if fs::remove_file(self.metadata_path(key)).is_ok() {
            removed = true;
        }
        if fs::remove_dir_all(self.tiles_path(key)).is_ok() {
            removed = true;
        }

        removed
    }
}

// =============================================================================
// Tests
// =============================================================================
