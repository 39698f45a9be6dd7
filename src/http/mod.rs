pub mod control;
pub mod media;
pub mod state;
pub mod ws;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::http::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let web_root = state.web_root.clone();

    let router = Router::new()
        // Playback clients
        .route("/ws", get(ws::client_socket))
        // Transport API
        .route("/play", post(control::play_audio))
        .route("/vplay", post(control::play_video))
        .route("/pause", post(control::pause))
        .route("/stop", post(control::stop))
        .route("/health", get(control::health))
        .route("/connections", get(control::connections))
        // Command layer
        .route("/search", get(control::search))
        .route("/command", post(control::command))
        .route("/reload", post(control::reload))
        // Files referenced by directives
        .route("/media/{*path}", get(media::serve_media_get).head(media::serve_media_head));

    let router = match web_root {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
