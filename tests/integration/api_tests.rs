//! API integration tests for upload, listing, deletion, and tile serving.

use axum::http::StatusCode;

use super::test_utils::{body_bytes, is_valid_jpeg, json_body, png_bytes, TestApp};

// =============================================================================
// Upload
// =============================================================================

#[tokio::test]
async fn test_upload_builds_pyramid() {
    let app = TestApp::new();

    let json = app.upload_ok("sample.png", &png_bytes(600, 400)).await;
    assert_eq!(json["cached"], false);
    assert_eq!(json["dzi_url"], "/tiles/sample.dzi");
    assert_eq!(json["meta"]["width"], 600);
    assert_eq!(json["meta"]["height"], 400);
    assert_eq!(json["meta"]["file_type"], "png");
    assert_eq!(json["meta"]["original_name"], "sample.png");

    // The descriptor is now published
    let key = gigaview::CacheKey::derive("sample.png");
    assert!(app.store.exists(&key));
}

#[tokio::test]
async fn test_reupload_is_cached() {
    let app = TestApp::new();

    let first = app.upload_ok("sample.png", &png_bytes(600, 400)).await;
    assert_eq!(first["cached"], false);

    // Same name, different bytes: the stale pyramid is reused by design
    let second = app.upload_ok("sample.png", &png_bytes(900, 300)).await;
    assert_eq!(second["cached"], true);
    assert_eq!(second["meta"]["width"], 600);
}

#[tokio::test]
async fn test_upload_name_is_normalized() {
    let app = TestApp::new();

    let json = app.upload_ok("my photo (1).png", &png_bytes(64, 64)).await;
    assert_eq!(json["dzi_url"], "/tiles/my_photo_1.dzi");
}

#[tokio::test]
async fn test_upload_temp_file_is_cleaned_up() {
    let app = TestApp::new();

    app.upload_ok("sample.png", &png_bytes(64, 64)).await;

    let leftovers: Vec<_> = std::fs::read_dir(app.store.root())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_string_lossy()
                .starts_with("_temp_")
        })
        .collect();
    assert!(leftovers.is_empty(), "temp upload left behind: {leftovers:?}");
}

// =============================================================================
// Upload Errors
// =============================================================================

#[tokio::test]
async fn test_upload_unsupported_extension() {
    let app = TestApp::new();

    let response = app.upload("malware.exe", b"MZ").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("unsupported"));
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let app = TestApp::new();

    let response = app
        .request(
            axum::http::Request::builder()
                .method("POST")
                .uri("/upload")
                .header(
                    "content-type",
                    "multipart/form-data; boundary=gigaview-test-boundary",
                )
                .body(axum::body::Body::from(
                    "--gigaview-test-boundary--\r\n".to_string(),
                ))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "no file provided");
}

#[tokio::test]
async fn test_upload_corrupt_image() {
    let app = TestApp::new();

    let response = app.upload("broken.png", b"definitely not a png").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = json_body(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Failed to process image"));

    // No descriptor published, nothing listed
    let key = gigaview::CacheKey::derive("broken.png");
    assert!(!app.store.exists(&key));
    let list = json_body(app.get("/images").await).await;
    assert_eq!(list["images"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_upload_too_large() {
    let app = TestApp::with_max_upload(500);

    // Any real PNG of this size is comfortably past 500 bytes
    let response = app.upload("big.png", &png_bytes(100, 100)).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("too large"));
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_images_empty() {
    let app = TestApp::new();

    let response = app.get("/images").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["images"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_images_lists_uploads() {
    let app = TestApp::new();

    app.upload_ok("first.png", &png_bytes(100, 80)).await;
    app.upload_ok("second.png", &png_bytes(64, 64)).await;

    let json = json_body(app.get("/images").await).await;
    let images = json["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);

    let names: Vec<_> = images
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"first"));
    assert!(names.contains(&"second"));

    for image in images {
        assert!(image["dzi_url"].as_str().unwrap().ends_with(".dzi"));
        assert!(image["meta"]["width"].as_u64().unwrap() > 0);
    }
}

// =============================================================================
// Tile Serving
// =============================================================================

#[tokio::test]
async fn test_serve_descriptor() {
    let app = TestApp::new();
    app.upload_ok("sample.png", &png_bytes(600, 400)).await;

    let response = app.get("/tiles/sample.dzi").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/xml"
    );

    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("TileSize=\"512\""));
    assert!(body.contains("Overlap=\"1\""));
    assert!(body.contains("Width=\"600\""));
    assert!(body.contains("Height=\"400\""));
}

#[tokio::test]
async fn test_serve_tile_with_immutable_caching() {
    let app = TestApp::new();
    app.upload_ok("sample.png", &png_bytes(600, 400)).await;

    // Top level of a 600x400 image is level 10
    let response = app.get("/tiles/sample_files/10/0_0.jpg").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "image/jpeg"
    );
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "public, max-age=604800, immutable"
    );

    let body = body_bytes(response).await;
    assert!(is_valid_jpeg(&body));
}

#[tokio::test]
async fn test_tile_not_found() {
    let app = TestApp::new();

    let response = app.get("/tiles/ghost.dzi").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/tiles/ghost_files/0/0_0.jpg").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tile_path_traversal_rejected() {
    let app = TestApp::new();

    let response = app.get("/tiles/..%2F..%2Fetc%2Fpasswd").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Deletion
// =============================================================================

#[tokio::test]
async fn test_delete_removes_everything() {
    let app = TestApp::new();
    app.upload_ok("sample.png", &png_bytes(600, 400)).await;

    let response = app.delete("sample").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["success"], true);

    // Descriptor, tiles, and listing are all gone
    let key = gigaview::CacheKey::derive("sample.png");
    assert!(!app.store.exists(&key));
    assert_eq!(
        app.get("/tiles/sample.dzi").await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.get("/tiles/sample_files/10/0_0.jpg").await.status(),
        StatusCode::NOT_FOUND
    );
    let list = json_body(app.get("/images").await).await;
    assert_eq!(list["images"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_delete_missing_is_not_found() {
    let app = TestApp::new();

    let response = app.delete("ghost").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Image not found");
}

#[tokio::test]
async fn test_delete_then_reupload_rebuilds() {
    let app = TestApp::new();

    app.upload_ok("sample.png", &png_bytes(100, 100)).await;
    app.delete("sample").await;

    let json = app.upload_ok("sample.png", &png_bytes(200, 150)).await;
    assert_eq!(json["cached"], false);
    assert_eq!(json["meta"]["width"], 200);
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].as_str().is_some());
}
