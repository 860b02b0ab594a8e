//! User account handlers

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use super::html_page;
use crate::{
    accounts::{AccountError, Confirmation},
    error::{ApiError, ApiResult},
    jwt::TokenIdentity,
    models::{LoginRequest, SignupRequest, UpdateUserRequest, UserResponse},
    state::AppState,
    validation::JsonBody,
};

/// Response for a successful login
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Map an account failure to its HTTP form, logging anything unexpected
/// and hiding it behind `failure`
fn account_error(failure: &'static str) -> impl FnOnce(AccountError) -> ApiError {
    move |e| match e {
        AccountError::LoginTaken(_) | AccountError::EmailTaken(_) | AccountError::InactiveUser => {
            ApiError::Conflict(e.to_string())
        }
        AccountError::InvalidCredentials => ApiError::Unauthorized(e.to_string()),
        AccountError::NotFound => ApiError::NotFound(e.to_string()),
        other => {
            error!("{}: {}", failure, other);
            ApiError::Internal(failure.to_string())
        }
    }
}

/// User ids are integers; anything else names no user
fn parse_user_id(id: &str) -> Option<i64> {
    id.parse().ok()
}

/// Get a user by id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_user_id(&id).ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    let user = state
        .accounts
        .get(id)
        .await
        .map_err(account_error("Database error."))?;

    Ok(Json(json!({
        "user": UserResponse::from(user),
        "message": "User found."
    })))
}

/// Delete a user and return what was removed
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_user_id(&id).ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    let user = state
        .accounts
        .delete(id)
        .await
        .map_err(account_error("Error deleting user."))?;

    Ok(Json(json!({
        "user": UserResponse::from(user),
        "message": "User successfully deleted."
    })))
}

/// Register a new, inactive user and email the confirmation link
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    let signup = payload.validate()?;

    let user = state
        .accounts
        .signup(signup)
        .await
        .map_err(account_error("Error inserting user."))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": UserResponse::from(user),
            "message": "User successfully inserted."
        })),
    ))
}

/// Update the password, email or activation of the user named in the body
pub async fn update_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let update = payload.validate()?;

    let user = state
        .accounts
        .update(update)
        .await
        .map_err(account_error("Error updating user."))?;

    Ok(Json(json!({
        "user": UserResponse::from(user),
        "message": "User successfully updated."
    })))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let credentials = payload.validate()?;

    let issued = state
        .accounts
        .login(credentials)
        .await
        .map_err(account_error("Error logging in."))?;

    Ok(Json(TokenResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_in: issued.expires_in,
    }))
}

/// Revoke the token this request was made with
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<TokenIdentity>,
) -> ApiResult<impl IntoResponse> {
    state
        .accounts
        .logout(&session)
        .await
        .map_err(account_error("Error logging out."))?;

    Ok(Json(json!({
        "message": "User successfully logged out."
    })))
}

/// Activate the account behind a confirmation link
///
/// Reached by a plain GET from an email client, so the answer is HTML and
/// must never be cached.
pub async fn confirm(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let templates = &state.templates;

    let page = match parse_user_id(&id) {
        None => html_page(StatusCode::NOT_FOUND, templates.user_not_found()),
        Some(id) => match state.accounts.confirm(id).await {
            Ok(Confirmation::Activated(user)) => {
                html_page(StatusCode::OK, templates.activated(&user.login, &user.email))
            }
            Ok(Confirmation::AlreadyActive(user)) => {
                html_page(StatusCode::OK, templates.already_active(&user.login, &user.email))
            }
            Err(AccountError::NotFound) => {
                html_page(StatusCode::NOT_FOUND, templates.user_not_found())
            }
            Err(e) => {
                error!("Failed to confirm user {}: {}", id, e);
                html_page(StatusCode::INTERNAL_SERVER_ERROR, templates.confirm_error())
            }
        },
    };

    ([(header::CACHE_CONTROL, "no-store")], page).into_response()
}
