//! HTTP server layer for Gigaview.
//!
//! Thin I/O plumbing around the build-and-cache engine: the handlers
//! validate requests, delegate to the [`crate::store::BuildCoordinator`]
//! and [`crate::store::TileStore`], and shape JSON responses.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          HTTP Layer                             │
//! │   POST /upload   GET /images   POST /delete   GET /tiles/...    │
//! │                                                                 │
//! │  ┌─────────────────────────┐  ┌─────────────────────────────┐   │
//! │  │        handlers         │  │           routes            │   │
//! │  │  (validation, JSON)     │  │  (router, CORS, tracing)    │   │
//! │  └─────────────────────────┘  └─────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    delete_handler, health_handler, images_handler, tiles_handler, upload_handler, AppState,
    ErrorBody, HealthResponse, ImageEntry, ImagesResponse, UploadResponse, ALLOWED_EXTENSIONS,
};
pub use routes::{create_router, RouterConfig};
