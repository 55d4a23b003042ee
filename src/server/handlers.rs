//! HTTP request handlers for the Gigaview API.
//!
//! # Endpoints
//!
//! - `POST /upload` - Upload an image and build (or reuse) its pyramid
//! - `GET /images` - List all processed images, newest first
//! - `POST /delete/{name}` - Delete an image's pyramid and metadata
//! - `GET /tiles/{*path}` - Serve descriptor and tile files
//! - `GET /health` - Health check endpoint

use std::path::{Component, Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use crate::error::{PyramidError, UploadError};
use crate::pyramid::SourceImage;
use crate::store::{BuildCoordinator, CacheKey, ImageMetadata};

/// Extensions accepted at the upload boundary, checked before any I/O.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "bmp", "webp"];

/// Cache-Control for published tiles: immutable for 7 days. A tile's
/// content never changes for the same address.
const TILE_CACHE_CONTROL: &str = "public, max-age=604800, immutable";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state, passed to handlers via Axum's State extractor.
pub struct AppState {
    /// The build coordinator (owns the tile store)
    pub coordinator: Arc<BuildCoordinator>,

    /// Upload size limit in bytes
    pub max_upload: u64,
}

impl AppState {
    pub fn new(coordinator: Arc<BuildCoordinator>, max_upload: u64) -> Self {
        Self {
            coordinator,
            max_upload,
        }
    }
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            coordinator: Arc::clone(&self.coordinator),
            max_upload: self.max_upload,
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error body: `{"success": false, "error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl ErrorBody {
    fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

/// Successful upload response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,

    /// True if the pyramid already existed and no encode ran
    pub cached: bool,

    /// URL of the published descriptor, relative to the server root
    pub dzi_url: String,

    pub meta: ImageMetadata,
}

/// One entry in the image list.
#[derive(Debug, Serialize)]
pub struct ImageEntry {
    pub name: String,
    pub dzi_url: String,
    pub meta: ImageMetadata,
}

/// Response from the image list endpoint.
#[derive(Debug, Serialize)]
pub struct ImagesResponse {
    pub images: Vec<ImageEntry>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

fn descriptor_url(key: &CacheKey) -> String {
    format!("/tiles/{key}.dzi")
}

// =============================================================================
// Upload Handler
// =============================================================================

/// Handle `POST /upload`.
///
/// Validates the multipart upload, stages it in a temp file (removed on
/// every exit path), and hands it to the build coordinator. Re-uploads of
/// an already-processed name short-circuit to the cached pyramid.
pub async fn upload_handler(State(state): State<AppState>, multipart: Multipart) -> Response {
    match process_upload(&state, multipart).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(response) => response,
    }
}

async fn process_upload(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<UploadResponse, Response> {
    // Walk the multipart body until the `file` field shows up; everything
    // for this upload happens while that field is live.
    loop {
        let mut field = multipart
            .next_field()
            .await
            .map_err(|e| invalid_input(UploadError::Read(e.to_string())))?
            .ok_or_else(|| invalid_input(UploadError::MissingFile))?;

        if field.name() != Some("file") {
            continue;
        }

        let original_name = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| invalid_input(UploadError::EmptyFileName))?;

        let extension = FsPath::new(&original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(invalid_input(UploadError::UnsupportedExtension {
                extension,
                allowed: ALLOWED_EXTENSIONS.join(", "),
            }));
        }

        let key = CacheKey::derive(&original_name);

        // Short-circuit before staging anything: re-uploading a processed
        // name reuses the existing pyramid.
        if state.coordinator.store().exists(&key) {
            info!(key = %key, "already processed, reusing tiles");
            return Ok(UploadResponse {
                success: true,
                cached: true,
                dzi_url: descriptor_url(&key),
                meta: state.coordinator.store().load_metadata(&key),
            });
        }

        info!(key = %key, name = %original_name, "processing upload");

        // Stage the upload in a temp file; the guard removes it on every
        // exit path, build success or failure.
        let temp_path = state.coordinator.store().temp_source_path(&key, &extension);
        let staged = TempFile::new(temp_path.clone());

        let byte_size = write_field_to_file(&mut field, &temp_path, state.max_upload)
            .await
            .map_err(invalid_input)?;

        let source = SourceImage {
            path: temp_path,
            original_name: original_name.clone(),
            byte_size,
        };

        let outcome = state
            .coordinator
            .ensure_built(&key, source)
            .await
            .map_err(build_failure)?;

        drop(staged);

        return Ok(UploadResponse {
            success: true,
            cached: outcome.was_cached,
            dzi_url: descriptor_url(&key),
            meta: outcome.meta,
        });
    }
}

/// Stream the field to disk, enforcing the size limit as bytes arrive.
async fn write_field_to_file(
    field: &mut axum::extract::multipart::Field<'_>,
    path: &FsPath,
    limit: u64,
) -> Result<u64, UploadError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| UploadError::Read(e.to_string()))?;

    let mut written: u64 = 0;
    loop {
        // The router's body limit sits slightly above `limit`; if it trips
        // first, report it as the same oversize rejection.
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(UploadError::TooLarge {
                    size: written,
                    limit,
                });
            }
            Err(e) => return Err(UploadError::Read(e.to_string())),
        };
        written += chunk.len() as u64;
        if written > limit {
            return Err(UploadError::TooLarge {
                size: written,
                limit,
            });
        }
        file.write_all(&chunk)
            .await
            .map_err(|e| UploadError::Read(e.to_string()))?;
    }
    file.flush()
        .await
        .map_err(|e| UploadError::Read(e.to_string()))?;

    Ok(written)
}

/// Deletes its file on drop. Keeps temp uploads from outliving the build.
struct TempFile {
    path: PathBuf,
}

impl TempFile {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn invalid_input(err: UploadError) -> Response {
    let status = match err {
        UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    };
    warn!("upload rejected: {err}");
    (status, Json(ErrorBody::new(err.to_string()))).into_response()
}

fn build_failure(err: PyramidError) -> Response {
    match err {
        PyramidError::Decode { .. } => {
            warn!("image processing error: {err}");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorBody::new(format!("Failed to process image: {err}"))),
            )
                .into_response()
        }
        PyramidError::Storage(_) | PyramidError::TileEncode { .. } => {
            error!("pyramid build error: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("Internal server error")),
            )
                .into_response()
        }
    }
}

// =============================================================================
// List Handler
// =============================================================================

/// Handle `GET /images`: all published pyramids, newest first.
pub async fn images_handler(State(state): State<AppState>) -> Response {
    match state.coordinator.store().list_pyramids() {
        Ok(entries) => {
            let images = entries
                .into_iter()
                .map(|entry| ImageEntry {
                    name: entry.key.as_str().to_string(),
                    dzi_url: descriptor_url(&entry.key),
                    meta: entry.meta,
                })
                .collect();
            (StatusCode::OK, Json(ImagesResponse { images })).into_response()
        }
        Err(e) => {
            error!("failed to scan tile cache: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("Internal server error")),
            )
                .into_response()
        }
    }
}

// =============================================================================
// Delete Handler
// =============================================================================

/// Handle `POST /delete/{name}`.
///
/// The name is normalized through the same key derivation as uploads, and
/// deletion runs under the key's build lock so it cannot race a build.
pub async fn delete_handler(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let key = CacheKey::derive(&name);

    if state.coordinator.delete(&key).await {
        #[derive(Serialize)]
        struct DeleteResponse {
            success: bool,
        }
        (StatusCode::OK, Json(DeleteResponse { success: true })).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorBody::new("Image not found")),
        )
            .into_response()
    }
}

// =============================================================================
// Tile Handler
// =============================================================================

/// Handle `GET /tiles/{*path}`: serve descriptor and tile files.
///
/// Tiles are immutable once published and get an aggressive cache
/// directive; descriptors are revalidated so a deleted image disappears
/// promptly.
pub async fn tiles_handler(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    let Some(relative) = sanitize_tile_path(&path) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new("Invalid tile path")),
        )
            .into_response();
    };

    let full_path = state.coordinator.store().root().join(&relative);
    match tokio::fs::read(&full_path).await {
        Ok(data) => {
            let (content_type, cache_control) = match full_path
                .extension()
                .and_then(|e| e.to_str())
            {
                Some("dzi") => ("application/xml", "no-cache"),
                Some("jpg") | Some("jpeg") => ("image/jpeg", TILE_CACHE_CONTROL),
                Some("json") => ("application/json", "no-cache"),
                _ => ("application/octet-stream", "no-cache"),
            };
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::CACHE_CONTROL, cache_control),
                ],
                data,
            )
                .into_response()
        }
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody::new("Tile not found")),
        )
            .into_response(),
    }
}

/// Reject path traversal: only plain relative components are allowed.
fn sanitize_tile_path(path: &str) -> Option<PathBuf> {
    let path = FsPath::new(path);
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            _ => return None,
        }
    }
    if clean.as_os_str().is_empty() {
        None
    } else {
        Some(clean)
    }
}

// =============================================================================
// Health Handler
// =============================================================================

/// Handle `GET /health`.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
