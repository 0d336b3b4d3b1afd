use axum::extract::State;
use axum::http::StatusCode;
use axum::{Form, Json};
use tracing::info;

use vault::sanitize_username;

use crate::state::{AppState, CredentialsForm, JsonResult, MessageResponse};
use crate::users::UserStoreError;
use crate::utils::json_error;

// registration requires a home directory an administrator already created;
// it never creates one
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> JsonResult<MessageResponse> {
    let Some(user) = sanitize_username(&form.username) else {
        return Err(json_error(StatusCode::BAD_REQUEST, "invalid username"));
    };
    if form.password.is_empty() {
        return Err(json_error(StatusCode::BAD_REQUEST, "missing password"));
    }
    if !state.roots.user_home(&user).is_dir() {
        return Err(json_error(
            StatusCode::FORBIDDEN,
            "no home directory for this user",
        ));
    }

    match state.users.register(&user, &form.password) {
        Ok(()) => {
            info!("Registered user {}", user);
            Ok(Json(MessageResponse {
                message: "registered successfully",
            }))
        }
        Err(UserStoreError::AlreadyRegistered) => {
            Err(json_error(StatusCode::CONFLICT, "user already exists"))
        }
        Err(err) => Err(json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("registration failed: {}", err),
        )),
    }
}

pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> JsonResult<MessageResponse> {
    let Some(user) = sanitize_username(&form.username) else {
        return Err(json_error(StatusCode::BAD_REQUEST, "invalid username"));
    };

    match state.users.verify(&user, &form.password) {
        Ok(()) => Ok(Json(MessageResponse {
            message: "login successful",
        })),
        Err(UserStoreError::NotRegistered) => {
            Err(json_error(StatusCode::NOT_FOUND, "user not registered"))
        }
        Err(UserStoreError::WrongPassword) => {
            Err(json_error(StatusCode::UNAUTHORIZED, "incorrect password"))
        }
        Err(err) => Err(json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("login failed: {}", err),
        )),
    }
}
