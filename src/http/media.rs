use std::path::{Component, Path as FsPath, PathBuf};

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use http_range_header::parse_range_header;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::http::state::AppState;
use crate::media::mime::mime_for;

/// A file under the media root that is about to be served.
struct ServedFile {
    path: PathBuf,
    size: u64,
    mime: &'static str,
}

/// Map a request path onto a regular file below `root`. Only plain name
/// components are accepted, so absolute paths and `..` never leave the
/// root. Symlinks inside the root are followed, matching what the scanner
/// indexes.
fn locate(root: &FsPath, requested: &str) -> Option<ServedFile> {
    let relative = FsPath::new(requested);
    if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
        tracing::warn!("Refusing media path {:?}", requested);
        return None;
    }
    let path = root.join(relative);
    let meta = std::fs::metadata(&path).ok()?;
    if !meta.is_file() {
        return None;
    }
    Some(ServedFile {
        mime: mime_for(&path),
        size: meta.len(),
        path,
    })
}

fn file_headers(file: &ServedFile) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(file.mime));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(file.size));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers
}

fn not_satisfiable(size: u64) -> Response {
    (
        StatusCode::RANGE_NOT_SATISFIABLE,
        [(header::CONTENT_RANGE, format!("bytes */{size}"))],
    )
        .into_response()
}

/// HEAD /media/{*path}: headers only; the file is not opened.
pub async fn serve_media_head(State(state): State<AppState>, Path(requested): Path<String>) -> Response {
    match locate(state.dispatcher.urls().media_root(), &requested) {
        Some(file) => (StatusCode::OK, file_headers(&file)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// GET /media/{*path}: whole file, or one byte range per RFC 7233.
pub async fn serve_media_get(
    State(state): State<AppState>,
    Path(requested): Path<String>,
    req_headers: HeaderMap,
) -> Response {
    let Some(file) = locate(state.dispatcher.urls().media_root(), &requested) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let headers = file_headers(&file);

    if let Some(range) = req_headers.get(header::RANGE) {
        return match range.to_str() {
            Ok(range) => range_response(&file, range, headers).await,
            Err(_) => not_satisfiable(file.size),
        };
    }

    let handle = match tokio::fs::File::open(&file.path).await {
        Ok(f) => f,
        Err(e) => {
            tracing::error!("Failed to open {}: {}", file.path.display(), e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let body = Body::from_stream(ReaderStream::new(handle));
    (StatusCode::OK, headers, body).into_response()
}

/// 206 for the first satisfiable range, 416 otherwise. Multi-range
/// requests are answered with their first range only.
async fn range_response(file: &ServedFile, range: &str, mut headers: HeaderMap) -> Response {
    let Ok(parsed) = parse_range_header(range) else {
        return not_satisfiable(file.size);
    };
    let Ok(ranges) = parsed.validate(file.size) else {
        return not_satisfiable(file.size);
    };
    let Some(first) = ranges.into_iter().next() else {
        return not_satisfiable(file.size);
    };

    let start = *first.start();
    let end = *first.end(); // inclusive
    let length = end - start + 1;

    let mut handle = match tokio::fs::File::open(&file.path).await {
        Ok(f) => f,
        Err(e) => {
            tracing::error!("Range request: failed to open {}: {}", file.path.display(), e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    if let Err(e) = handle.seek(std::io::SeekFrom::Start(start)).await {
        tracing::error!("Range request: failed to seek in {}: {}", file.path.display(), e);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let content_range = format!("bytes {}-{}/{}", start, end, file.size);
    if let Ok(value) = HeaderValue::from_str(&content_range) {
        headers.insert(header::CONTENT_RANGE, value);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));

    let body = Body::from_stream(ReaderStream::new(handle.take(length)));
    (StatusCode::PARTIAL_CONTENT, headers, body).into_response()
}
