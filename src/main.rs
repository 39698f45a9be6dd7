use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use cuecast::dispatch::{Dispatcher, MediaUrls};
use cuecast::media::catalog::{Catalog, CatalogSettings};
use cuecast::session::registry::SessionRegistry;
use cuecast::{cli, config, http};

/// Resolves on the first Ctrl+C (graceful shutdown). A second Ctrl+C while
/// connections drain force-exits.
async fn wait_for_shutdown() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    tracing::info!("Shutting down, press Ctrl+C again to force");
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\ncuecast: forced exit");
            std::process::exit(1);
        }
    });
}

/// Exit when a catalog folder is missing or not a directory. This is the
/// only fatal startup condition.
fn require_dir(label: &str, path: &Path) {
    if !path.is_dir() {
        eprintln!("error: {} folder is missing or not a directory: {}", label, path.display());
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();

    let file_config = config::find_config_file(args.config.as_deref()).and_then(|path| {
        match config::load_config(&path) {
            Ok(cfg) => {
                tracing::debug!("Loaded config from {}", path.display());
                Some(cfg)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config file: {}", e);
                None
            }
        }
    });

    let config = match config::Config::resolve(file_config, &args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    require_dir("media", &config.media_root);
    // Only the media root is resolved; the kind folders stay below it even
    // when they are symlinks, so every indexed path maps to a /media URL.
    let media_root = std::fs::canonicalize(&config.media_root).unwrap_or_else(|e| {
        eprintln!("error: cannot resolve {}: {}", config.media_root.display(), e);
        std::process::exit(1);
    });
    let settings = CatalogSettings {
        audio_root: media_root.join(&config.audio_dir),
        video_root: media_root.join(&config.video_dir),
        exclude: config.exclude.clone(),
        snapshot_dir: config.cache_dir.clone(),
    };

    tracing::info!("cuecast {} on port {}", env!("CUECAST_VERSION"), config.port);
    tracing::info!("Audio folder: {}", settings.audio_root.display());
    tracing::info!("Video folder: {}", settings.video_root.display());
    tracing::info!("Media URLs: {}/media/...", config.public_url);

    require_dir("audio", &settings.audio_root);
    require_dir("video", &settings.video_root);

    let catalog = Arc::new(Catalog::new(settings));
    let registry = Arc::new(SessionRegistry::new());
    let urls = MediaUrls::new(&config.public_url, media_root, config.audio_dir.clone());
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&catalog),
        registry,
        urls,
        config.volume,
    ));

    // Load the catalog in the background; until it lands, queries answer
    // "not loaded yet" while clients can already connect.
    let loader = Arc::clone(&catalog);
    let force = config.rebuild;
    tokio::spawn(async move {
        loader.load_all(force).await;
    });

    let state = http::state::AppState::new(dispatcher).with_web_root(config.web_root.clone());
    let app = http::build_router(state);

    let host = if config.localhost { "127.0.0.1" } else { "0.0.0.0" };
    let addr = format!("{}:{}", host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap_or_else(|e| {
        eprintln!("error: failed to bind {}: {}", addr, e);
        std::process::exit(1);
    });
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await
        .unwrap_or_else(|e| tracing::error!("HTTP server error: {}", e));

    tracing::info!("Goodbye.");
}
