use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::dispatch::describe;
use crate::error::DispatchError;
use crate::http::state::AppState;
use crate::media::mime::MediaKind;
use crate::session::broadcast::BroadcastReport;
use crate::session::message::{unix_seconds, ControlCommand, PlaybackDirective};

/// Volume used when a play request does not specify one.
const DEFAULT_REQUEST_VOLUME: f32 = 0.5;

#[derive(Debug, Deserialize)]
pub struct AudioPlayRequest {
    pub audio_url: String,
    pub volume: Option<f32>,
    #[serde(rename = "loop")]
    pub looped: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct VideoPlayRequest {
    pub video_url: String,
    pub volume: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_search_kind")]
    pub kind: MediaKind,
}

fn default_search_kind() -> MediaKind {
    MediaKind::Audio
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub text: String,
}

fn status_for(error: &DispatchError) -> StatusCode {
    match error {
        DispatchError::NotReady { .. } => StatusCode::SERVICE_UNAVAILABLE,
        DispatchError::NoMatch { .. } => StatusCode::NOT_FOUND,
        DispatchError::Stale { .. } => StatusCode::GONE,
        DispatchError::Unreachable => StatusCode::CONFLICT,
        DispatchError::InvalidArgument(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn error_response(error: &DispatchError) -> Response {
    let body = json!({
        "status": "error",
        "message": describe(error),
    });
    (status_for(error), Json(body)).into_response()
}

fn checked_volume(volume: Option<f32>) -> Result<f32, DispatchError> {
    let volume = volume.unwrap_or(DEFAULT_REQUEST_VOLUME);
    if (0.0..=1.0).contains(&volume) {
        Ok(volume)
    } else {
        Err(DispatchError::InvalidArgument(format!(
            "volume must be between 0 and 1, got {volume}"
        )))
    }
}

fn played_response(message: &str, report: &BroadcastReport, data: Value) -> Response {
    Json(json!({
        "status": "success",
        "message": message,
        "clients_notified": report.clients_notified,
        "data": data,
    }))
    .into_response()
}

/// POST /play: push an audio URL to every connected client.
pub async fn play_audio(State(state): State<AppState>, Json(req): Json<AudioPlayRequest>) -> Response {
    let volume = match checked_volume(req.volume) {
        Ok(v) => v,
        Err(e) => return error_response(&e),
    };
    let urls = state.dispatcher.urls();
    let directive = PlaybackDirective::new(&req.audio_url, MediaKind::Audio, volume, req.looped.unwrap_or(false))
        .with_metadata_url(urls.metadata_url(&req.audio_url));
    let report = state.dispatcher.broadcaster().broadcast_play(&directive);
    played_response("Audio playback triggered", &report, directive.to_json())
}

/// POST /vplay: push a video URL to every connected client.
pub async fn play_video(State(state): State<AppState>, Json(req): Json<VideoPlayRequest>) -> Response {
    let volume = match checked_volume(req.volume) {
        Ok(v) => v,
        Err(e) => return error_response(&e),
    };
    let directive = PlaybackDirective::new(&req.video_url, MediaKind::Video, volume, false);
    let report = state.dispatcher.broadcaster().broadcast_play(&directive);
    played_response("Video playback triggered", &report, directive.to_json())
}

fn control_response(state: &AppState, command: ControlCommand) -> Response {
    let report = state.dispatcher.control(command);
    let message = match command {
        ControlCommand::Pause => "Pause command sent",
        ControlCommand::Stop => "Stop command sent",
    };
    Json(json!({
        "status": "success",
        "message": message,
        "clients_notified": report.clients_notified,
    }))
    .into_response()
}

/// POST /pause
pub async fn pause(State(state): State<AppState>) -> Response {
    control_response(&state, ControlCommand::Pause)
}

/// POST /stop
pub async fn stop(State(state): State<AppState>) -> Response {
    control_response(&state, ControlCommand::Stop)
}

/// GET /health: liveness plus the newest client's reported media state.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let registry = state.dispatcher.registry();
    Json(json!({
        "status": "success",
        "media_status": registry.latest_state(),
        "active_connections": registry.active_count(),
        "timestamp": unix_seconds(Utc::now()),
    }))
}

/// GET /connections: count plus one line per client, oldest first.
pub async fn connections(State(state): State<AppState>) -> Json<Value> {
    let sessions = state.dispatcher.registry().sessions();
    Json(json!({
        "active_connections": sessions.len(),
        "clients": sessions,
        "timestamp": unix_seconds(Utc::now()),
    }))
}

/// GET /search?q=...&kind=audio|video: ranked candidates, best first.
pub async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    match state.dispatcher.search(params.kind, &params.q) {
        Ok(found) => Json(found).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST /command: run one line of chat text and return the reply.
pub async fn command(State(state): State<AppState>, Json(req): Json<CommandRequest>) -> Response {
    let reply = state.dispatcher.execute_text(&req.text).await;
    Json(reply).into_response()
}

/// POST /reload: rescan the media folders and swap the new catalog in.
pub async fn reload(State(state): State<AppState>) -> Response {
    let reports = state.dispatcher.reload().await;
    if reports.is_empty() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "error", "message": "reload failed, previous catalog kept" })),
        )
            .into_response();
    }
    Json(json!({ "status": "success", "reports": reports })).into_response()
}
