//! Configuration management for Gigaview.
//!
//! Configuration comes from command-line arguments via clap, with environment
//! variable fallbacks using the `GIGAVIEW_` prefix, and sensible defaults for
//! every option.
//!
//! # Environment Variables
//!
//! - `GIGAVIEW_HOST` - Server bind address (default: 127.0.0.1)
//! - `GIGAVIEW_PORT` - Server port (default: 5000)
//! - `GIGAVIEW_TILES_DIR` - Directory for the tile cache (default: ./tiles)
//! - `GIGAVIEW_TILE_SIZE` - Tile edge length in pixels (default: 512)
//! - `GIGAVIEW_OVERLAP` - Tile overlap in pixels (default: 1)
//! - `GIGAVIEW_JPEG_QUALITY` - JPEG quality for tiles (default: 85)
//! - `GIGAVIEW_MAX_UPLOAD` - Upload size limit in bytes (default: 2 GiB)

use std::path::PathBuf;

use clap::Parser;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host. Localhost only: this is a local viewer, not a
/// public service.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default tile cache directory.
pub const DEFAULT_TILES_DIR: &str = "tiles";

/// Default tile edge length in pixels. Larger tiles mean fewer HTTP requests.
pub const DEFAULT_TILE_SIZE: u32 = 512;

/// Default tile overlap in pixels, shared with neighboring tiles so the
/// viewer can composite without seams.
pub const DEFAULT_OVERLAP: u32 = 1;

/// Default JPEG quality for encoded tiles.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Default upload size limit: 2 GiB.
pub const DEFAULT_MAX_UPLOAD: u64 = 2 * 1024 * 1024 * 1024;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Gigaview - a tile server for very large images.
///
/// Uploads are sliced into a Deep Zoom pyramid of JPEG tiles cached on disk,
/// then served over HTTP for smooth pan/zoom viewing.
#[derive(Parser, Debug, Clone)]
#[command(name = "gigaview")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "GIGAVIEW_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "GIGAVIEW_PORT")]
    pub port: u16,

    /// Directory where pyramids, descriptors, and metadata are cached.
    #[arg(long, default_value = DEFAULT_TILES_DIR, env = "GIGAVIEW_TILES_DIR")]
    pub tiles_dir: PathBuf,

    /// Tile edge length in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "GIGAVIEW_TILE_SIZE")]
    pub tile_size: u32,

    /// Overlap border in pixels on interior tile edges.
    #[arg(long, default_value_t = DEFAULT_OVERLAP, env = "GIGAVIEW_OVERLAP")]
    pub overlap: u32,

    /// JPEG quality for encoded tiles (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "GIGAVIEW_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    /// Maximum accepted upload size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD, env = "GIGAVIEW_MAX_UPLOAD")]
    pub max_upload: u64,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.tile_size == 0 {
            return Err("tile_size must be greater than 0".to_string());
        }
        if self.tile_size > 8192 {
            return Err("tile_size must be at most 8192".to_string());
        }
        if self.overlap >= self.tile_size {
            return Err("overlap must be smaller than tile_size".to_string());
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }
        if self.max_upload == 0 {
            return Err("max_upload must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Tests
// =============================================================================
