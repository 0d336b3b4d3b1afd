pub mod auth;
pub mod browse;
pub mod cover;
pub mod stream;
pub mod system;
pub mod update;
pub mod upload;

use axum::{
    body::Body,
    extract::State,
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use crate::state::{AppState, HealthResponse};
use crate::utils::json_error_response;

// health probe, updater bootstrap, and cover art (fetched by image views
// that cannot set headers) answer without the shared secret
const OPEN_PATHS: [&str; 3] = ["/", "/update/check", "/cover"];

pub const SECRET_HEADER: &str = "x-secret-key";

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/browse", get(browse::browse))
        .route("/stream", get(stream::stream))
        .route("/cover", get(cover::cover))
        .route("/upload_zip", post(upload::upload_zip))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/update/check", get(update::check))
        .route("/update/download", get(update::download))
        .route("/system/folders", get(system::folders))
        .route("/system/upload_update", post(system::upload_update))
        .layer(middleware::from_fn_with_state(state.clone(), require_secret))
        .with_state(state)
}

async fn require_secret(
    State(state): State<AppState>,
    req: axum::http::Request<Body>,
    next: Next,
) -> Response {
    if OPEN_PATHS.contains(&req.uri().path()) {
        return next.run(req).await;
    }

    let provided = req
        .headers()
        .get(SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    if provided != Some(state.secret_key.as_str()) {
        return json_error_response(StatusCode::FORBIDDEN, "invalid secret key");
    }
    next.run(req).await
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}
