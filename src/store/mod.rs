//! Filesystem-backed pyramid store.
//!
//! The tiles directory is the single durable source of truth: there is no
//! in-memory index to keep consistent. Each image's [`CacheKey`] addresses
//! three on-disk artifacts:
//!
//! ```text
//! {tiles_dir}/{key}.dzi                        descriptor (publish marker)
//! {tiles_dir}/{key}_files/{level}/{col}_{row}.jpg   tile tree
//! {tiles_dir}/{key}_meta.json                  metadata record
//! ```
//!
//! A pyramid is complete and servable iff its descriptor file exists; the
//! encoder writes it last and atomically, so a crashed build leaves at most
//! an orphaned tile tree that no reader can see.
//!
//! # Components
//!
//! - [`CacheKey`]: normalized identifier derived from the upload's base name
//! - [`TileStore`]: path layout, existence checks, atomic descriptor publish
//! - [`ImageMetadata`]: per-image descriptive facts, JSON on disk
//! - registry scan and composite deletion on [`TileStore`]
//! - [`BuildCoordinator`]: per-key build serialization

mod coordinator;
mod key;
mod metadata;
mod registry;

pub use coordinator::{BuildCoordinator, BuildOutcome};
pub use key::CacheKey;
pub use metadata::ImageMetadata;
pub use registry::PyramidEntry;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::pyramid::PyramidDescriptor;

// =============================================================================
// Tile Store
// =============================================================================

/// Path layout and descriptor lifecycle for the on-disk tile cache.
///
/// Cheap to clone the paths out of; all state lives on disk.
#[derive(Debug)]
pub struct TileStore {
    root: PathBuf,
}

impl TileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The tiles directory this store is rooted at.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the descriptor file for a key.
    pub fn descriptor_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{key}.dzi"))
    }

    /// Root directory of the tile tree for a key.
    pub fn tiles_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{key}_files"))
    }

    /// Directory holding one level's tiles.
    pub fn level_path(&self, key: &CacheKey, level: usize) -> PathBuf {
        self.tiles_path(key).join(level.to_string())
    }

    /// Path of one tile file. `col` counts along X, `row` along Y.
    pub fn tile_path(&self, key: &CacheKey, level: usize, col: u32, row: u32) -> PathBuf {
        self.level_path(key, level).join(format!("{col}_{row}.jpg"))
    }

    /// Path of the metadata record for a key.
    pub fn metadata_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{key}_meta.json"))
    }

    /// Path for the temporary copy of an upload while it is being encoded.
    ///
    /// Each call yields a distinct path, so concurrent uploads of the same
    /// name never share a staging file.
    pub fn temp_source_path(&self, key: &CacheKey, extension: &str) -> PathBuf {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);
        self.root
            .join(format!("_temp_{key}_{seq}.{extension}"))
    }

    /// Whether a complete, published pyramid exists for this key.
    ///
    /// Only the descriptor counts: a tile tree left behind by a failed build
    /// does not make the pyramid visible.
    pub fn exists(&self, key: &CacheKey) -> bool {
        self.descriptor_path(key).is_file()
    }

    /// Read and parse the published descriptor for a key.
    ///
    /// Returns `None` if the pyramid is not published or the descriptor
    /// cannot be parsed.
    pub fn load_descriptor(&self, key: &CacheKey) -> Option<PyramidDescriptor> {
        let xml = fs::read_to_string(self.descriptor_path(key)).ok()?;
        PyramidDescriptor::from_xml(&xml)
    }

    /// Atomically publish a descriptor, making the pyramid visible.
    ///
    /// Writes to a temp file in the same directory and renames it into
    /// place, so readers either see no descriptor or a complete one.
    pub fn publish_descriptor(
        &self,
        key: &CacheKey,
        descriptor: &PyramidDescriptor,
    ) -> io::Result<()> {
        let final_path = self.descriptor_path(key);
        let temp_path = self.root.join(format!("{key}.dzi.tmp"));
        fs::write(&temp_path, descriptor.to_xml())?;
        fs::rename(&temp_path, &final_path)
    }
}

// =============================================================================
// Tests
// =============================================================================
