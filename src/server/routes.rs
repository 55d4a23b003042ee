//! Router configuration for Gigaview.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health           - Health check
//! POST /upload           - Upload an image, build or reuse its pyramid
//! GET  /images           - List processed images
//! POST /delete/{name}    - Delete an image
//! GET  /tiles/{*path}    - Serve descriptors and tiles
//! ```

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    delete_handler, health_handler, images_handler, tiles_handler, upload_handler, AppState,
};

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Upload body size limit in bytes
    pub max_upload: u64,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    pub fn new(max_upload: u64) -> Self {
        Self {
            max_upload,
            enable_tracing: true,
        }
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Headroom above the file size limit for multipart boundaries and part
/// headers, so the file limit itself is enforced while streaming and can
/// produce a proper JSON error.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the application router.
///
/// The upload route gets a raised body limit (axum's default is far below
/// a large raster); everything else keeps the default.
pub fn create_router(state: AppState, config: RouterConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .allow_origin(Any);

    let upload_routes = Router::new()
        .route("/upload", post(upload_handler))
        .layer(DefaultBodyLimit::max(
            config.max_upload as usize + MULTIPART_OVERHEAD,
        ))
        .with_state(state.clone());

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/images", get(images_handler))
        .route("/delete/{name}", post(delete_handler))
        .route("/tiles/{*path}", get(tiles_handler))
        .with_state(state)
        .merge(upload_routes)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

// =============================================================================
// Tests
// =============================================================================
