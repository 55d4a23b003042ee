//! Pyramid encoder.
//!
//! Turns one decoded source image into a complete Deep Zoom pyramid on
//! disk: every level from full resolution down to 1x1, each level sliced
//! into overlapping JPEG tiles, finished by an atomic descriptor publish.
//!
//! # Memory strategy
//!
//! The source raster is decoded once; every other level is derived by 2x
//! downsampling the previous one, and only the level currently being tiled
//! is held in memory. Peak residency is the full raster plus its half-size
//! neighbor, regardless of how many levels the pyramid has.
//!
//! # Failure behavior
//!
//! The descriptor is written last, via temp-then-rename. If any step fails,
//! the partial tile tree is removed best-effort and the descriptor is never
//! published, so the failed build stays invisible to readers.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ImageReader, RgbImage};
use tracing::{debug, info};

use crate::error::PyramidError;
use crate::store::{CacheKey, ImageMetadata, TileStore};

use super::descriptor::PyramidDescriptor;
use super::geometry::{plan, PyramidLevel};

/// Default JPEG quality for tiles: a good size/quality balance.
pub const DEFAULT_QUALITY: u8 = 85;

/// Timestamp format for `ImageMetadata::processed_at`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// =============================================================================
// Inputs
// =============================================================================

/// An uploaded source image, staged in a temp file for the duration of one
/// build. The caller owns the temp file's lifetime; the encoder only reads.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Temp file holding the raw upload bytes
    pub path: PathBuf,

    /// File name as uploaded
    pub original_name: String,

    /// Upload size in bytes
    pub byte_size: u64,
}

/// Tiling parameters for a pyramid build.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Tile edge length in pixels
    pub tile_size: u32,

    /// Overlap border in pixels on interior tile edges
    pub overlap: u32,

    /// JPEG quality (clamped to 1-100)
    pub quality: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            tile_size: 512,
            overlap: 1,
            quality: DEFAULT_QUALITY,
        }
    }
}

// =============================================================================
// Encoder
// =============================================================================

/// Build the full pyramid for `source` under `key`.
///
/// Decodes the source, writes every level's tiles, publishes the descriptor
/// atomically as the final step, and returns the descriptor together with
/// metadata computed from the decoded raster's true dimensions.
///
/// On failure no descriptor is published and the partial tile tree is
/// removed best-effort.
pub fn encode(
    store: &TileStore,
    key: &CacheKey,
    source: &SourceImage,
    options: &EncodeOptions,
) -> Result<(PyramidDescriptor, ImageMetadata), PyramidError> {
    let image = ImageReader::open(&source.path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| PyramidError::Decode {
            message: e.to_string(),
        })?;

    let (width, height) = (image.width(), image.height());
    let levels = plan(width, height, options.tile_size);
    info!(
        key = %key,
        width,
        height,
        levels = levels.len(),
        "building pyramid"
    );

    let descriptor = PyramidDescriptor::new(width, height, options.tile_size, options.overlap);
    let built = write_pyramid(store, key, image.into_rgb8(), &levels, options).and_then(|_| {
        store
            .publish_descriptor(key, &descriptor)
            .map_err(PyramidError::from)
    });

    if let Err(e) = built {
        let _ = fs::remove_dir_all(store.tiles_path(key));
        return Err(e);
    }

    let meta = source_metadata(source, width, height);
    info!(key = %key, megapixels = meta.megapixels, "pyramid complete");
    Ok((descriptor, meta))
}

/// Write tiles for every level, full resolution first, downsampling as we
/// descend so only one level (plus its half-size successor) is resident.
fn write_pyramid(
    store: &TileStore,
    key: &CacheKey,
    mut current: RgbImage,
    levels: &[PyramidLevel],
    options: &EncodeOptions,
) -> Result<(), PyramidError> {
    for level in levels.iter().rev() {
        debug_assert_eq!((current.width(), current.height()), (level.width, level.height));
        write_level(store, key, level, &current, options)?;
        if level.level > 0 {
            current = downsample_half(&current);
        }
    }
    Ok(())
}

/// Slice one level into tiles and write them as JPEG files.
///
/// A tile nominally covers `tile_size` pixels and is extended by `overlap`
/// pixels on each edge it shares with a neighbor. Edges on the image
/// boundary are never padded, so trailing tiles are smaller than nominal.
fn write_level(
    store: &TileStore,
    key: &CacheKey,
    level: &PyramidLevel,
    pixels: &RgbImage,
    options: &EncodeOptions,
) -> Result<(), PyramidError> {
    let dir = store.level_path(key, level.level);
    fs::create_dir_all(&dir)?;

    let tile_size = options.tile_size;
    let overlap = options.overlap;
    let quality = options.quality.clamp(1, 100);

    for row in 0..level.rows {
        for col in 0..level.columns {
            let x0 = if col == 0 { 0 } else { col * tile_size - overlap };
            let y0 = if row == 0 { 0 } else { row * tile_size - overlap };
            let x1 = ((col + 1) * tile_size + overlap).min(level.width);
            let y1 = ((row + 1) * tile_size + overlap).min(level.height);

            let tile = imageops::crop_imm(pixels, x0, y0, x1 - x0, y1 - y0).to_image();

            let mut jpeg = Vec::new();
            JpegEncoder::new_with_quality(&mut jpeg, quality)
                .encode_image(&tile)
                .map_err(|e| PyramidError::TileEncode {
                    level: level.level,
                    col,
                    row,
                    message: e.to_string(),
                })?;

            fs::write(store.tile_path(key, level.level, col, row), &jpeg)?;
        }
    }

    debug!(
        key = %key,
        level = level.level,
        tiles = level.tile_count(),
        "level written"
    );
    Ok(())
}

/// Ceiling-halve an image with a 2x box-equivalent filter.
fn downsample_half(image: &RgbImage) -> RgbImage {
    let width = image.width().div_ceil(2).max(1);
    let height = image.height().div_ceil(2).max(1);
    imageops::resize(image, width, height, FilterType::Triangle)
}

/// Metadata from the decoded raster's true dimensions and the upload facts.
fn source_metadata(source: &SourceImage, width: u32, height: u32) -> ImageMetadata {
    let file_type = Path::new(&source.original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    ImageMetadata {
        original_name: source.original_name.clone(),
        width,
        height,
        size: source.byte_size,
        file_type,
        processed_at: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        megapixels: ImageMetadata::megapixels_for(width, height),
    }
}

// =============================================================================
// Tests
// =============================================================================
