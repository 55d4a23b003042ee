use thiserror::Error;

/// Errors raised while building a tile pyramid for one image.
///
/// A build that fails with any of these variants never publishes a
/// descriptor, so readers never observe the partial pyramid.
#[derive(Debug, Error)]
pub enum PyramidError {
    /// The source image could not be decoded (corrupt or unreadable)
    #[error("failed to decode source image: {message}")]
    Decode { message: String },

    /// A tile or descriptor could not be written to disk
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// A tile could not be encoded to JPEG
    #[error("failed to encode tile at level {level} ({col}, {row}): {message}")]
    TileEncode {
        level: usize,
        col: u32,
        row: u32,
        message: String,
    },
}

/// Errors rejected at the upload boundary, before any build starts.
///
/// These are caller mistakes (HTTP 4xx), never retried automatically.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The multipart body contained no `file` field
    #[error("no file provided")]
    MissingFile,

    /// The uploaded file had an empty name
    #[error("no file selected")]
    EmptyFileName,

    /// The file extension is not an accepted raster format
    #[error("unsupported format '{extension}'. Use: {allowed}")]
    UnsupportedExtension { extension: String, allowed: String },

    /// The upload exceeds the configured size limit
    #[error("file too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    /// Error reading the multipart stream
    #[error("failed to read upload: {0}")]
    Read(String),
}
