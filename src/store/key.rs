//! Cache key derivation.
//!
//! Every uploaded image is addressed on disk by a [`CacheKey`] derived from
//! the upload's base name. The derivation is stable: the same file name
//! always maps to the same key, so re-uploading a file with the same name
//! finds the already-built pyramid.
//!
//! This also means two different files sharing a base name collide on one
//! key and the second upload is served the first one's pyramid. That reuse
//! is deliberate (see [`crate::store::BuildCoordinator::ensure_built`]).

use std::fmt;
use std::path::Path;

use chrono::Utc;

/// A normalized, filesystem-safe identifier for one image.
///
/// Contains only ASCII alphanumerics, `_`, `-`, and interior `.`, and is
/// never empty, so it can be embedded directly in file names and URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive a key from an uploaded file's name.
    ///
    /// Strips the extension, keeps `[A-Za-z0-9._-]`, maps whitespace to `_`,
    /// drops everything else, and trims leading/trailing dots and
    /// underscores. An empty result falls back to `image_<unix_seconds>`.
    pub fn derive(file_name: &str) -> Self {
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        let mut safe = String::with_capacity(stem.len());
        for c in stem.chars() {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                safe.push(c);
            } else if c.is_whitespace() {
                safe.push('_');
            }
        }

        let trimmed = safe.trim_matches(|c| c == '.' || c == '_');
        if trimmed.is_empty() {
            Self(format!("image_{}", Utc::now().timestamp()))
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Construct a key from an already-normalized string.
    ///
    /// Used by the registry when scanning descriptor files it wrote itself.
    pub(crate) fn from_normalized(name: String) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Tests
// =============================================================================
