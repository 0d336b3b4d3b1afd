use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use vault::{Resolver, Roots, VaultWriter};

use crate::users::UserStore;

#[derive(Clone)]
pub struct AppState {
    pub secret_key: String,
    pub roots: Roots,
    pub resolver: Resolver,
    pub writer: VaultWriter,
    pub users: UserStore,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub processed: usize,
}

#[derive(Serialize)]
pub struct FoldersResponse {
    pub folders: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    pub username: String,
    #[serde(default)]
    pub folder: String,
}

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub username: String,
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct BrowseItem {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
}

#[derive(Serialize)]
pub struct BrowseResponse {
    pub current_path: String,
    pub items: Vec<BrowseItem>,
    pub is_vault: bool,
}

pub type JsonResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;
