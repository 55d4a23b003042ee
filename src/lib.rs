//! # Gigaview
//!
//! A local tile server for very large images. Uploads are pre-sliced into a
//! multi-resolution Deep Zoom pyramid of small JPEG tiles cached on disk,
//! then served over HTTP so a viewer can pan and zoom smoothly at any
//! resolution.
//!
//! ## Architecture
//!
//! - [`pyramid`] - Geometry planning, tile encoding, and the DZI descriptor
//! - [`store`] - Cache keys, on-disk layout, metadata, registry, and the
//!   build coordinator that serializes builds per key
//! - [`server`] - Axum-based HTTP boundary (upload, list, delete, tiles)
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error taxonomy
//!
//! ## Guarantees
//!
//! - A pyramid is visible only after its descriptor is published, which
//!   happens atomically as the last step of a successful build.
//! - Concurrent uploads of the same image never run two builds: the
//!   coordinator admits one encode per key and everyone else reuses it.
//! - Failed builds leave nothing visible and clean up after themselves.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gigaview::{
//!     pyramid::EncodeOptions,
//!     server::{create_router, AppState, RouterConfig},
//!     store::{BuildCoordinator, TileStore},
//! };
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let store = Arc::new(TileStore::open("tiles")?);
//!     let coordinator = Arc::new(BuildCoordinator::new(store, EncodeOptions::default()));
//!
//!     let state = AppState::new(coordinator, 2 * 1024 * 1024 * 1024);
//!     let router = create_router(state, RouterConfig::new(2 * 1024 * 1024 * 1024));
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//!     axum::serve(listener, router).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod pyramid;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use error::{PyramidError, UploadError};
pub use pyramid::{
    encode, max_level, plan, EncodeOptions, PyramidDescriptor, PyramidLevel, SourceImage,
    DEFAULT_QUALITY,
};
pub use server::{create_router, AppState, RouterConfig, ALLOWED_EXTENSIONS};
pub use store::{
    BuildCoordinator, BuildOutcome, CacheKey, ImageMetadata, PyramidEntry, TileStore,
};
