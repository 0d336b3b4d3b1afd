use std::fs;
use std::path::Path;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use tracing::info;

use vault::roots::{reserved_root, GENERAL_DIR};

use crate::state::{AppState, ErrorResponse, FoldersResponse, JsonResult, MessageResponse};
use crate::utils::json_error;

use super::update::VERSION_MANIFEST;

const FALLBACK_APK_NAME: &str = "update.apk";

// owner/playlist paths an upload can target: non-system top-level
// directories plus the shared General area
pub async fn folders(State(state): State<AppState>) -> JsonResult<FoldersResponse> {
    let entries = fs::read_dir(state.roots.base()).map_err(|err| {
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("listing failed: {}", err),
        )
    })?;

    let mut folders = Vec::new();
    for entry in entries.flatten() {
        if !entry.path().is_dir() {
            continue;
        }
        let owner = entry.file_name();
        let Some(owner) = owner.to_str() else { continue };
        if owner.starts_with('.') {
            continue;
        }
        if reserved_root(owner) && owner != GENERAL_DIR {
            continue;
        }
        let Ok(subs) = fs::read_dir(entry.path()) else {
            continue;
        };
        for sub in subs.flatten() {
            if !sub.path().is_dir() {
                continue;
            }
            if let Some(name) = sub.file_name().to_str() {
                folders.push(format!("{}/{}", owner, name));
            }
        }
    }
    folders.sort();
    Ok(Json(FoldersResponse { folders }))
}

pub async fn upload_update(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> JsonResult<MessageResponse> {
    let mut package: Option<(String, Bytes)> = None;
    let mut manifest: Option<Bytes> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        match field.name() {
            Some("apk_file") => {
                let name = field
                    .file_name()
                    .and_then(|raw| Path::new(raw).file_name())
                    .and_then(|n| n.to_str())
                    .unwrap_or(FALLBACK_APK_NAME)
                    .to_string();
                let data = field.bytes().await.map_err(bad_multipart)?;
                package = Some((name, data));
            }
            Some("json_file") => {
                manifest = Some(field.bytes().await.map_err(bad_multipart)?);
            }
            _ => {}
        }
    }

    let Some((package_name, package_data)) = package else {
        return Err(json_error(StatusCode::BAD_REQUEST, "missing apk_file field"));
    };
    let Some(manifest) = manifest else {
        return Err(json_error(StatusCode::BAD_REQUEST, "missing json_file field"));
    };
    if let Err(err) = serde_json::from_slice::<serde_json::Value>(&manifest) {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            format!("invalid version manifest: {}", err),
        ));
    }

    let updates = state.roots.updates();
    if let Ok(entries) = fs::read_dir(&updates) {
        for entry in entries.flatten() {
            if entry.path().is_file() {
                let _ = fs::remove_file(entry.path());
            }
        }
    }

    tokio::fs::write(updates.join(&package_name), &package_data)
        .await
        .map_err(|err| {
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("package write failed: {}", err),
            )
        })?;
    tokio::fs::write(updates.join(VERSION_MANIFEST), &manifest)
        .await
        .map_err(|err| {
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("manifest write failed: {}", err),
            )
        })?;

    info!("Published update package {}", package_name);
    Ok(Json(MessageResponse {
        message: "update published",
    }))
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> (StatusCode, Json<ErrorResponse>) {
    json_error(
        StatusCode::BAD_REQUEST,
        format!("invalid multipart payload: {}", err),
    )
}
