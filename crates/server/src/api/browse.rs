use std::fs;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;

use common::{clean_logical_path, is_audio_name};
use vault::{ResolveError, RootKind};

use crate::state::{AppState, BrowseItem, BrowseQuery, BrowseResponse, ErrorResponse, JsonResult};
use crate::utils::json_error;

// artist label for files that live outside the vault hierarchy
const DEFAULT_ARTIST_LABEL: &str = "Tonevault";

pub async fn browse(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> JsonResult<BrowseResponse> {
    let resolved = match state.resolver.resolve_dir(&query.username, &query.folder) {
        Ok(Some(resolved)) => resolved,
        Ok(None) => return Err(json_error(StatusCode::NOT_FOUND, "folder not found")),
        Err(err) => return Err(resolve_error(err)),
    };
    // the resolver already accepted it, so the cleanup cannot fail
    let folder = clean_logical_path(&query.folder).unwrap_or_default();
    let is_vault = resolved.kind == RootKind::Vault;

    let entries = fs::read_dir(&resolved.path).map_err(|err| {
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("listing failed: {}", err),
        )
    })?;

    let mut items = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        let rel_path = if folder.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", folder, name)
        };
        if entry.path().is_dir() {
            items.push(BrowseItem {
                name,
                kind: "folder",
                path: rel_path,
                artist: None,
            });
        } else if is_audio_name(&name) {
            let artist = if is_vault {
                artist_hint(&rel_path)
            } else {
                DEFAULT_ARTIST_LABEL.to_string()
            };
            items.push(BrowseItem {
                name,
                kind: "file",
                path: rel_path,
                artist: Some(artist),
            });
        }
    }

    // folders first, then case-insensitive by name
    items.sort_by(|a, b| {
        let a_key = (a.kind != "folder", a.name.to_lowercase());
        let b_key = (b.kind != "folder", b.name.to_lowercase());
        a_key.cmp(&b_key)
    });

    Ok(Json(BrowseResponse {
        current_path: folder,
        items,
        is_vault,
    }))
}

// in vault listings the first path segment is the artist directory
fn artist_hint(rel_path: &str) -> String {
    rel_path
        .split('/')
        .next()
        .unwrap_or(DEFAULT_ARTIST_LABEL)
        .to_string()
}

pub(crate) fn resolve_error(err: ResolveError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        ResolveError::Traversal => json_error(StatusCode::FORBIDDEN, "invalid path"),
        ResolveError::BadUser => json_error(StatusCode::BAD_REQUEST, "invalid username"),
    }
}
