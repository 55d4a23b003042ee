//! Deep Zoom Image (DZI) descriptor.
//!
//! The descriptor is a small XML document describing the pyramid geometry:
//! tile size, overlap, tile format, and the full-resolution dimensions.
//! That is everything a Deep Zoom viewer (e.g. OpenSeadragon) needs to
//! compute which `(level, col, row)` tiles to request for any viewport.
//!
//! The descriptor's presence on disk is also the atomic "build complete"
//! marker: the encoder writes it last, via temp-file-then-rename, so an
//! incomplete build never exposes a descriptor.

/// Descriptor of a completed tile pyramid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyramidDescriptor {
    /// Tile edge length in pixels
    pub tile_size: u32,

    /// Overlap border in pixels on interior tile edges
    pub overlap: u32,

    /// Tile file format extension ("jpg")
    pub format: String,

    /// Full-resolution width in pixels
    pub width: u32,

    /// Full-resolution height in pixels
    pub height: u32,
}

impl PyramidDescriptor {
    /// Create a descriptor for a pyramid of JPEG tiles.
    pub fn new(width: u32, height: u32, tile_size: u32, overlap: u32) -> Self {
        Self {
            tile_size,
            overlap,
            format: "jpg".to_string(),
            width,
            height,
        }
    }

    /// Render the DZI XML document.
    ///
    /// # Example Output
    ///
    /// ```xml
    /// <?xml version="1.0" encoding="UTF-8"?>
    /// <Image xmlns="http://schemas.microsoft.com/deepzoom/2008"
    ///        TileSize="512"
    ///        Overlap="1"
    ///        Format="jpg">
    ///   <Size Width="4096" Height="3072" />
    /// </Image>
    /// ```
    pub fn to_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Image xmlns="http://schemas.microsoft.com/deepzoom/2008"
       TileSize="{tile_size}"
       Overlap="{overlap}"
       Format="{format}">
  <Size Width="{width}" Height="{height}" />
</Image>"#,
            tile_size = self.tile_size,
            overlap = self.overlap,
            format = self.format,
            width = self.width,
            height = self.height,
        )
    }

    /// Parse a descriptor back from its XML form.
    ///
    /// Returns `None` if any required attribute is missing or malformed.
    /// Deliberately minimal: only reads documents this crate writes, so a
    /// simple attribute scan is enough and avoids an XML dependency.
    pub fn from_xml(xml: &str) -> Option<Self> {
        fn attr(xml: &str, name: &str) -> Option<String> {
            let pattern = format!("{name}=\"");
            let start = xml.find(&pattern)? + pattern.len();
            let end = xml[start..].find('"')? + start;
            Some(xml[start..end].to_string())
        }

        Some(Self {
            tile_size: attr(xml, "TileSize")?.parse().ok()?,
            overlap: attr(xml, "Overlap")?.parse().ok()?,
            format: attr(xml, "Format")?,
            width: attr(xml, "Width")?.parse().ok()?,
            height: attr(xml, "Height")?.parse().ok()?,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
