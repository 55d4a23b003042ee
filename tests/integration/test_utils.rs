//! Test utilities for integration tests.
//!
//! Helpers for spinning up an app against a temp tile directory, building
//! multipart upload requests, and decoding JSON responses.

use std::io::Cursor;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use image::{ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;
use tower::ServiceExt;

use gigaview::pyramid::EncodeOptions;
use gigaview::server::{create_router, AppState, RouterConfig};
use gigaview::store::{BuildCoordinator, TileStore};

// =============================================================================
// Test Application
// =============================================================================

/// A router wired to a temp tile directory.
///
/// Holds the `TempDir` so the cache outlives the test body.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<TileStore>,
    _dir: TempDir,
}

impl TestApp {
    /// Create an app with default encode options and a 64 MB upload limit.
    pub fn new() -> Self {
        Self::with_max_upload(64 * 1024 * 1024)
    }

    /// Create an app with a custom upload limit.
    pub fn with_max_upload(max_upload: u64) -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(TileStore::open(dir.path().join("tiles")).unwrap());
        let coordinator = Arc::new(BuildCoordinator::new(
            Arc::clone(&store),
            EncodeOptions::default(),
        ));

        let state = AppState::new(coordinator, max_upload);
        let router = create_router(
            state,
            RouterConfig::new(max_upload).with_tracing(false),
        );

        Self {
            router,
            store,
            _dir: dir,
        }
    }

    /// Send one request through the router.
    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// GET a path and return the response.
    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.request(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Upload a file through `POST /upload`.
    pub async fn upload(&self, file_name: &str, bytes: &[u8]) -> Response<Body> {
        let (content_type, body) = multipart_body(file_name, bytes);
        self.request(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header("content-type", content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// Upload and assert success, returning the parsed JSON body.
    pub async fn upload_ok(&self, file_name: &str, bytes: &[u8]) -> serde_json::Value {
        let response = self.upload(file_name, bytes).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["success"], true);
        json
    }

    /// Delete an image through `POST /delete/{name}`.
    pub async fn delete(&self, name: &str) -> Response<Body> {
        self.request(
            Request::builder()
                .method("POST")
                .uri(format!("/delete/{name}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

// =============================================================================
// Request & Response Helpers
// =============================================================================

/// Build a multipart/form-data body with one `file` field.
pub fn multipart_body(file_name: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let boundary = "gigaview-test-boundary";

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={boundary}"), body)
}

/// Collect a response body and parse it as JSON.
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect a response body as raw bytes.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

// =============================================================================
// Test Images
// =============================================================================

/// Encode a gradient test image as PNG bytes.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Check for JPEG SOI/EOI markers.
pub fn is_valid_jpeg(data: &[u8]) -> bool {
    data.len() >= 4
        && data[0] == 0xFF
        && data[1] == 0xD8
        && data[data.len() - 2] == 0xFF
        && data[data.len() - 1] == 0xD9
}
