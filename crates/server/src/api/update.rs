use std::fs;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use axum::Json;
use tokio_util::io::ReaderStream;

use crate::state::{AppState, JsonResult};
use crate::utils::{json_error, json_error_response};

const APK_MIME: &str = "application/vnd.android.package-archive";
pub(crate) const VERSION_MANIFEST: &str = "version.json";

// open endpoint: clients poll it before logging in
pub async fn check(State(state): State<AppState>) -> JsonResult<serde_json::Value> {
    let manifest = state.roots.updates().join(VERSION_MANIFEST);
    if !manifest.is_file() {
        return Ok(Json(serde_json::json!({ "version": 0 })));
    }
    let contents = tokio::fs::read_to_string(&manifest).await.map_err(|err| {
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("manifest read failed: {}", err),
        )
    })?;
    let value: serde_json::Value = serde_json::from_str(&contents).map_err(|err| {
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("invalid version manifest: {}", err),
        )
    })?;
    Ok(Json(value))
}

pub async fn download(State(state): State<AppState>) -> Response {
    let updates = state.roots.updates();
    let mut packages: Vec<String> = match fs::read_dir(&updates) {
        Ok(entries) => entries
            .flatten()
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| name.to_lowercase().ends_with(".apk"))
            .collect(),
        Err(_) => Vec::new(),
    };
    packages.sort();
    let Some(name) = packages.first() else {
        return json_error_response(StatusCode::NOT_FOUND, "no update package available");
    };

    let path = updates.join(name);
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(err) => {
            return json_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("open failed: {}", err),
            )
        }
    };
    let size = match file.metadata().await {
        Ok(meta) => meta.len(),
        Err(err) => {
            return json_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("stat failed: {}", err),
            )
        }
    };

    let mut response = Response::new(Body::from_stream(ReaderStream::new(file)));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(APK_MIME));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
    let disposition = format!("attachment; filename=\"{}\"", name);
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}
