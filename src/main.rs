//! Gigaview - a tile server for very large images.
//!
//! This binary parses configuration, opens the tile store, and starts the
//! HTTP server.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gigaview::{
    config::Config,
    pyramid::EncodeOptions,
    server::{create_router, AppState, RouterConfig},
    store::TileStore,
    BuildCoordinator,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let store = match TileStore::open(&config.tiles_dir) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(
                "Failed to open tiles directory {}: {}",
                config.tiles_dir.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    };

    let options = EncodeOptions {
        tile_size: config.tile_size,
        overlap: config.overlap,
        quality: config.jpeg_quality,
    };
    let coordinator = Arc::new(BuildCoordinator::new(Arc::clone(&store), options));

    info!("Gigaview v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Tiles directory: {}", store.root().display());
    info!(
        "  Tile geometry: {}px tiles, {}px overlap, JPEG quality {}",
        config.tile_size, config.overlap, config.jpeg_quality
    );
    info!(
        "  Upload limit: {} MB",
        config.max_upload / (1024 * 1024)
    );

    match store.list_pyramids() {
        Ok(existing) => info!("  Found {} cached image(s)", existing.len()),
        Err(e) => {
            error!("Failed to scan tiles directory: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let state = AppState::new(coordinator, config.max_upload);
    let router_config =
        RouterConfig::new(config.max_upload).with_tracing(!config.no_tracing);
    let router = create_router(state, router_config);

    let addr = config.bind_address();
    info!("");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/images", addr);
    info!("    curl -F file=@photo.png http://{}/upload", addr);
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "gigaview=debug,tower_http=debug"
    } else {
        "gigaview=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
