//! Per-image metadata records.
//!
//! Metadata is descriptive only; tile serving never depends on it. A
//! missing or corrupt record therefore degrades to "unknown facts" rather
//! than an error: [`TileStore::load_metadata`] always returns a value.

use std::fs;
use std::io;

use serde::{Deserialize, Serialize};

use super::{CacheKey, TileStore};

/// Descriptive facts about one processed image.
///
/// Replaced wholesale on re-save, never partially updated, and deleted only
/// together with its pyramid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageMetadata {
    /// File name as uploaded, before key normalization
    pub original_name: String,

    /// Full-resolution width in pixels
    pub width: u32,

    /// Full-resolution height in pixels
    pub height: u32,

    /// Upload size in bytes
    pub size: u64,

    /// Source format, lowercase extension without the dot ("png", "tiff")
    pub file_type: String,

    /// Local timestamp of the build, `%Y-%m-%dT%H:%M:%S`.
    /// Lexicographic order equals chronological order, which the registry
    /// relies on for sorting.
    pub processed_at: String,

    /// Pixel count in megapixels, rounded to one decimal
    pub megapixels: f64,
}

impl ImageMetadata {
    /// Compute the rounded megapixel count for given dimensions.
    pub fn megapixels_for(width: u32, height: u32) -> f64 {
        (width as f64 * height as f64 / 1_000_000.0 * 10.0).round() / 10.0
    }
}

impl TileStore {
    /// Persist metadata for a key, overwriting any prior record.
    pub fn save_metadata(&self, key: &CacheKey, meta: &ImageMetadata) -> io::Result<()> {
        let json = serde_json::to_string_pretty(meta)?;
        fs::write(self.metadata_path(key), json)
    }

    /// Load metadata for a key.
    ///
    /// Missing or unreadable records yield `ImageMetadata::default()`,
    /// never an error.
    pub fn load_metadata(&self, key: &CacheKey) -> ImageMetadata {
        fs::read_to_string(self.metadata_path(key))
            .ok()
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }
}

// =============================================================================
// Tests
// =============================================================================
