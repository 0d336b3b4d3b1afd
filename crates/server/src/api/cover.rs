use std::path::Path;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use common::{is_audio_name, DIR_COVER_NAMES};

use crate::state::{AppState, FileQuery};
use crate::utils::json_error_response;

use super::browse::resolve_error;

const FALLBACK_MIME: &str = "image/jpeg";

// embedded art first for track paths, then cover.jpg/folder.jpg next to the
// track (or inside the directory, for directory paths)
pub async fn cover(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> Response {
    let resolved = match state.resolver.resolve_cover_target(&query.username, &query.path) {
        Ok(Some(resolved)) => resolved,
        Ok(None) => return not_found(),
        Err(err) => return resolve_error(err).into_response(),
    };

    let mut target = resolved.path;
    let is_audio_file = target.is_file()
        && target
            .file_name()
            .and_then(|n| n.to_str())
            .map(is_audio_name)
            .unwrap_or(false);
    if is_audio_file {
        match metadata::read_cover(&target) {
            Ok(Some(art)) => {
                let mime = art.mime.unwrap_or_else(|| FALLBACK_MIME.to_string());
                return cover_response(art.data, &mime);
            }
            Ok(None) => {}
            Err(err) => debug!("No embedded art in {:?}: {:?}", target, err),
        }
        let Some(parent) = target.parent().map(Path::to_path_buf) else {
            return not_found();
        };
        target = parent;
    }

    if target.is_dir() {
        for name in DIR_COVER_NAMES {
            let candidate = target.join(name);
            if !candidate.is_file() {
                continue;
            }
            match tokio::fs::read(&candidate).await {
                Ok(data) => {
                    let mime = mime_guess::from_path(&candidate)
                        .first_raw()
                        .unwrap_or(FALLBACK_MIME);
                    return cover_response(data, mime);
                }
                Err(err) => warn!("Failed to read {:?}: {}", candidate, err),
            }
        }
    }

    not_found()
}

fn not_found() -> Response {
    json_error_response(StatusCode::NOT_FOUND, "no cover found")
}

fn cover_response(data: Vec<u8>, mime: &str) -> Response {
    let mut response = Response::new(Body::from(data));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(mime).unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000"),
    );
    response
}
