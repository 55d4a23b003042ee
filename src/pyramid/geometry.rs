//! Pyramid geometry planning.
//!
//! Pure functions that compute the full level list of a Deep Zoom pyramid
//! from the source dimensions. Level numbering follows the DZI convention:
//!
//! - Level 0 = 1x1 pixel (lowest resolution)
//! - Max level = full resolution, where max level = ceil(log2(max(w, h)))
//!
//! Each level's dimensions are the ceiling-halved dimensions of the level
//! above it, so dimensions at level L equal `ceil(full / 2^(max - L))`.
//!
//! Tile grid orientation: `columns` counts tiles along the X axis
//! (`ceil(level_width / tile_size)`), `rows` along the Y axis
//! (`ceil(level_height / tile_size)`). Tile files are named `{col}_{row}`.

// =============================================================================
// Pyramid Level
// =============================================================================

/// Geometry of one pyramid level.
///
/// Immutable once computed; the planner is deterministic, so the same source
/// dimensions always produce the same level list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PyramidLevel {
    /// DZI level index (0 = 1x1, highest = full resolution)
    pub level: usize,

    /// Level width in pixels
    pub width: u32,

    /// Level height in pixels
    pub height: u32,

    /// Number of tile columns (along X)
    pub columns: u32,

    /// Number of tile rows (along Y)
    pub rows: u32,
}

impl PyramidLevel {
    /// Total number of tiles at this level.
    pub fn tile_count(&self) -> u64 {
        self.columns as u64 * self.rows as u64
    }
}

// =============================================================================
// Planner
// =============================================================================

/// Compute the full level list for an image, ordered by level index
/// ascending (1x1 first, full resolution last).
///
/// Starts from `(width, height)` and repeatedly ceiling-halves until
/// reaching 1x1, inclusive. The returned vector is indexed by level:
/// `plan(...)[l].level == l`.
///
/// Zero dimensions are clamped to 1 so the plan always terminates.
pub fn plan(width: u32, height: u32, tile_size: u32) -> Vec<PyramidLevel> {
    let mut w = width.max(1);
    let mut h = height.max(1);

    // Collected full-resolution first, then reversed into DZI order.
    let mut dims = vec![(w, h)];
    while w > 1 || h > 1 {
        w = w.div_ceil(2);
        h = h.div_ceil(2);
        dims.push((w, h));
    }
    dims.reverse();

    dims.into_iter()
        .enumerate()
        .map(|(level, (width, height))| PyramidLevel {
            level,
            width,
            height,
            columns: width.div_ceil(tile_size).max(1),
            rows: height.div_ceil(tile_size).max(1),
        })
        .collect()
}

/// Calculate the maximum DZI level for given image dimensions.
///
/// `max_level = ceil(log2(max(width, height)))`, which equals
/// `plan(width, height, ..).len() - 1`.
pub fn max_level(width: u32, height: u32) -> usize {
    let max_dim = width.max(height).max(1) as f64;
    if max_dim <= 1.0 {
        return 0;
    }
    max_dim.log2().ceil() as usize
}

// =============================================================================
// Tests
// =============================================================================
