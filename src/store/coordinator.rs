//! Build coordination: at most one encode per key, system-wide.
//!
//! The coordinator owns a registry of per-key async mutexes, created lazily
//! on first use and never removed. The map grows with the number of
//! distinct uploaded names, which bounds it in practice; this is a
//! documented bound, not a leak.
//!
//! Existence is checked twice: once before taking the key's lock (fast path
//! for already-built pyramids) and again after acquiring it, because
//! another builder may have published between the check and the lock.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::error::PyramidError;
use crate::pyramid::{encode, EncodeOptions, PyramidDescriptor, SourceImage};

use super::{CacheKey, ImageMetadata, TileStore};

// =============================================================================
// Build Outcome
// =============================================================================

/// Result of `ensure_built`: the published pyramid's descriptor and
/// metadata, and whether it was already on disk.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// Descriptor of the published pyramid
    pub descriptor: PyramidDescriptor,

    /// Metadata record (default if the record is missing or unreadable)
    pub meta: ImageMetadata,

    /// True if the pyramid existed before this call and no encode ran
    pub was_cached: bool,
}

// =============================================================================
// Build Coordinator
// =============================================================================

/// Serializes pyramid builds per cache key.
///
/// Builds for distinct keys run in parallel; concurrent requests for the
/// same key are funneled through one mutex so exactly one encode runs and
/// the rest observe its published result. Deletion takes the same per-key
/// lock, so a delete can never interleave with a build of the same key.
pub struct BuildCoordinator {
    store: Arc<TileStore>,
    options: EncodeOptions,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl BuildCoordinator {
    pub fn new(store: Arc<TileStore>, options: EncodeOptions) -> Self {
        Self {
            store,
            options,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The store this coordinator builds into.
    pub fn store(&self) -> &Arc<TileStore> {
        &self.store
    }

    /// Ensure a published pyramid exists for `key`, building it if absent.
    ///
    /// If the descriptor is already on disk the source is ignored and the
    /// cached pyramid is returned with `was_cached = true`. This holds even
    /// when the new upload's bytes differ from the original: a key derived
    /// from the same base name is treated as the same logical image and is
    /// never rebuilt. Known, accepted limitation.
    ///
    /// The encode runs on the blocking pool; the per-key lock is held for
    /// the recheck + encode + publish sequence and released on every exit
    /// path, including encode panics.
    pub async fn ensure_built(
        &self,
        key: &CacheKey,
        source: SourceImage,
    ) -> Result<BuildOutcome, PyramidError> {
        if let Some(outcome) = self.cached_outcome(key) {
            info!(key = %key, "pyramid already built, reusing");
            return Ok(outcome);
        }

        let lock = self.lock_for(key).await;
        let _guard = lock.lock().await;

        // Re-check under the lock: another builder may have finished
        // between the first check and lock acquisition.
        if let Some(outcome) = self.cached_outcome(key) {
            info!(key = %key, "pyramid built concurrently, reusing");
            return Ok(outcome);
        }

        let store = Arc::clone(&self.store);
        let task_key = key.clone();
        let options = self.options;
        let (descriptor, meta) =
            tokio::task::spawn_blocking(move || encode(&store, &task_key, &source, &options))
                .await
                .map_err(|e| {
                    PyramidError::Storage(io::Error::other(format!("encode task failed: {e}")))
                })??;

        self.store.save_metadata(key, &meta)?;

        Ok(BuildOutcome {
            descriptor,
            meta,
            was_cached: false,
        })
    }

    /// Delete the pyramid for `key` under its build lock.
    ///
    /// Returns whether anything was removed. Taking the lock means a delete
    /// cannot race an in-progress build into resurrecting half of a
    /// pyramid.
    pub async fn delete(&self, key: &CacheKey) -> bool {
        let lock = self.lock_for(key).await;
        let _guard = lock.lock().await;
        let removed = self.store.remove_pyramid(key);
        if removed {
            info!(key = %key, "pyramid deleted");
        }
        removed
    }

    fn cached_outcome(&self, key: &CacheKey) -> Option<BuildOutcome> {
        let descriptor = self.store.load_descriptor(key)?;
        Some(BuildOutcome {
            descriptor,
            meta: self.store.load_metadata(key),
            was_cached: true,
        })
    }

    /// Get or lazily create the mutex for a key.
    async fn lock_for(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(key.as_str().to_string())
            .or_default()
            .clone()
    }
}

// =============================================================================
// Tests
// =============================================================================
