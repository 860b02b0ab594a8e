//! Catalog service routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, patch, post},
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::{middleware::auth_middleware, state::AppState};

pub mod movies;
pub mod users;

/// Create the router for the catalog service
///
/// Reads of the catalog, signup, login and confirmation are public; every
/// other method requires a bearer token.
pub fn create_router(state: AppState) -> Router {
    let auth_state = state.clone();
    let auth = move || middleware::from_fn_with_state(auth_state.clone(), auth_middleware);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/movies", get(movies::list_movies))
        .route(
            "/movies/:id",
            get(movies::get_movie).merge(
                post(movies::create_movie)
                    .patch(movies::update_movie)
                    .delete(movies::delete_movie)
                    .route_layer(auth()),
            ),
        )
        .route(
            "/users/:id",
            get(users::get_user)
                .delete(users::delete_user)
                .route_layer(auth()),
        )
        .route(
            "/signon",
            post(users::signup).merge(patch(users::update_user).route_layer(auth())),
        )
        .route("/login", post(users::login))
        .route("/logout", post(users::logout).route_layer(auth()))
        .route("/confirm/:id", get(users::confirm))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Landing page
pub async fn index(State(state): State<AppState>) -> Response {
    html_page(StatusCode::OK, state.templates.index())
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "catalog"
    }))
}

/// Wrap rendered HTML, or a bare 500 when rendering failed
pub(crate) fn html_page(status: StatusCode, rendered: Result<String, tera::Error>) -> Response {
    match rendered {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => {
            error!("Failed to render page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Html("Internal server error")).into_response()
        }
    }
}
