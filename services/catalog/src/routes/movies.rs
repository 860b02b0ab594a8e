//! Movie catalog handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use std::collections::HashMap;
use tracing::error;

use crate::{
    error::{ApiError, ApiResult},
    filters::MovieFilter,
    models::MoviePayload,
    state::AppState,
    validation::JsonBody,
};

const NOT_FOUND: &str = "Movie entry not found.";

/// Log a storage failure and hide it behind `message`
fn storage_error(message: &'static str) -> impl FnOnce(common::error::DatabaseError) -> ApiError {
    move |e| {
        error!("{}: {}", message, e);
        ApiError::Internal(message.to_string())
    }
}

/// List movies, filtered by the allow-listed query parameters
pub async fn list_movies(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<impl IntoResponse> {
    let filter = MovieFilter::build(&state.movie_filters, &params);

    let movies = state
        .movie_repository
        .list(&filter)
        .await
        .map_err(storage_error("Database error."))?;

    if movies.is_empty() {
        return Err(ApiError::NotFound("No movie entries found.".to_string()));
    }

    Ok(Json(json!({
        "movies": movies,
        "message": "Movie entries found."
    })))
}

/// Get a movie by id
pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let movie = state
        .movie_repository
        .find(&id)
        .await
        .map_err(storage_error("Database error."))?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    Ok(Json(json!({
        "movie": movie,
        "message": "Movie entry found."
    })))
}

/// Insert a movie under the path id
pub async fn create_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<MoviePayload>,
) -> ApiResult<impl IntoResponse> {
    let failure = "Error inserting movie entry.";

    let existing = state
        .movie_repository
        .find(&id)
        .await
        .map_err(storage_error(failure))?;
    if existing.is_some() {
        return Err(ApiError::Conflict(format!("Id {} already exists.", id)));
    }

    let fields = payload.validate(&id)?;
    let movie = state
        .movie_repository
        .insert(&id, &fields)
        .await
        .map_err(storage_error(failure))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "movie": movie,
            "message": "Movie entry successfully inserted."
        })),
    ))
}

/// Update a movie. Optional fields left out of the body keep their values.
pub async fn update_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<MoviePayload>,
) -> ApiResult<impl IntoResponse> {
    let failure = "Error updating movie entry.";

    state
        .movie_repository
        .find(&id)
        .await
        .map_err(storage_error(failure))?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    let fields = payload.validate(&id)?;
    let movie = state
        .movie_repository
        .update(&id, &fields)
        .await
        .map_err(storage_error(failure))?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    Ok(Json(json!({
        "movie": movie,
        "message": "Movie entry successfully updated."
    })))
}

/// Delete a movie and return what was removed
pub async fn delete_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let movie = state
        .movie_repository
        .delete(&id)
        .await
        .map_err(storage_error("Error deleting movie entry."))?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    Ok(Json(json!({
        "movie": movie,
        "message": "Movie entry deleted."
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::MockConfirmationMailer;
    use crate::models::Movie;
    use crate::repositories::{MockMovieRepository, MockUserRepository};
    use crate::routes::create_router;
    use crate::routes::tests::{bearer, empty_request, json_request, send_json, test_state};
    use common::error::DatabaseError;

    fn movie(id: &str, country: &str) -> Movie {
        Movie {
            id: id.to_string(),
            movie_type: "Movie".to_string(),
            title: format!("Title {}", id),
            director: Some("Someone".to_string()),
            cast: None,
            country: Some(country.to_string()),
            date_added: None,
            release_year: 2020,
            rating: Some("TV-MA".to_string()),
            duration: Some("90 min".to_string()),
            listed_in: "Dramas".to_string(),
            description: "A description.".to_string(),
        }
    }

    fn router(movies: MockMovieRepository) -> axum::Router {
        create_router(test_state(
            movies,
            MockUserRepository::new(),
            MockConfirmationMailer::new(),
        ))
    }

    fn required_body() -> serde_json::Value {
        json!({
            "type": "Movie",
            "title": "Dick Johnson Is Dead",
            "release_year": "2020",
            "listed_in": "Documentaries",
            "description": "A filmmaker stages her father's death."
        })
    }

    #[tokio::test]
    async fn test_list_without_params_is_unfiltered() {
        let mut movies = MockMovieRepository::new();
        movies
            .expect_list()
            .withf(|filter| filter.is_empty())
            .returning(|_| Ok(vec![movie("s1", "Brazil"), movie("s2", "India")]));

        let (status, body) = send_json(router(movies), empty_request("GET", "/movies", None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Movie entries found.");
        assert_eq!(body["movies"].as_array().unwrap().len(), 2);
        assert_eq!(body["movies"][0]["type"], "Movie");
    }

    #[tokio::test]
    async fn test_list_only_uses_allow_listed_params() {
        let mut movies = MockMovieRepository::new();
        movies
            .expect_list()
            .withf(|filter| {
                filter.where_clause() == " WHERE UPPER(\"country\") = UPPER($1)"
                    && filter.values().len() == 1
            })
            .returning(|_| Ok(vec![movie("s1", "Brazil")]));

        let (status, body) = send_json(
            router(movies),
            empty_request("GET", "/movies?country=brazil&description=anything", None),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["movies"][0]["country"], "Brazil");
    }

    #[tokio::test]
    async fn test_empty_list_is_not_found() {
        let mut movies = MockMovieRepository::new();
        movies.expect_list().returning(|_| Ok(vec![]));

        let (status, body) = send_json(
            router(movies),
            empty_request("GET", "/movies?release_year=1800", None),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "No movie entries found.");
    }

    #[tokio::test]
    async fn test_list_storage_failure_is_generic() {
        let mut movies = MockMovieRepository::new();
        movies
            .expect_list()
            .returning(|_| Err(DatabaseError::Configuration("relation missing".to_string())));

        let (status, body) = send_json(router(movies), empty_request("GET", "/movies", None)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Database error.");
    }

    #[tokio::test]
    async fn test_create_inserts_validated_fields() {
        let mut movies = MockMovieRepository::new();
        movies.expect_find().returning(|_| Ok(None));
        movies
            .expect_insert()
            .withf(|id, fields| id == "s9" && fields.release_year == 2020 && fields.director.is_none())
            .times(1)
            .returning(|id, _| Ok(movie(id, "United States")));

        let state = test_state(movies, MockUserRepository::new(), MockConfirmationMailer::new());
        let token = bearer(&state, 1);
        let (status, body) = send_json(
            create_router(state),
            json_request("POST", "/movies/s9", Some(&token), required_body()),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Movie entry successfully inserted.");
        assert_eq!(body["movie"]["id"], "s9");
    }

    #[tokio::test]
    async fn test_create_existing_id_conflicts() {
        let mut movies = MockMovieRepository::new();
        movies
            .expect_find()
            .returning(|id| Ok(Some(movie(id, "Brazil"))));
        movies.expect_insert().never();

        let state = test_state(movies, MockUserRepository::new(), MockConfirmationMailer::new());
        let token = bearer(&state, 1);
        let (status, body) = send_json(
            create_router(state),
            json_request("POST", "/movies/s1", Some(&token), required_body()),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Id s1 already exists.");
    }

    #[tokio::test]
    async fn test_create_reports_invalid_fields() {
        let mut movies = MockMovieRepository::new();
        movies.expect_find().returning(|_| Ok(None));
        movies.expect_insert().never();

        let state = test_state(movies, MockUserRepository::new(), MockConfirmationMailer::new());
        let token = bearer(&state, 1);
        let (status, body) = send_json(
            create_router(state),
            json_request("POST", "/movies/s1", Some(&token), json!({"title": "No type"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"]["type"].is_string());
        assert!(body["errors"]["release_year"].is_string());
        assert!(body["errors"].get("title").is_none());
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let mut movies = MockMovieRepository::new();
        movies.expect_find().never();

        let state = test_state(movies, MockUserRepository::new(), MockConfirmationMailer::new());
        let token = bearer(&state, 1);
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/movies/s1")
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .header(axum::http::header::AUTHORIZATION, token)
            .body(axum::body::Body::from("{\"title\": "))
            .unwrap();

        let (status, body) = send_json(create_router(state), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Malformed JSON request body.");
    }

    #[tokio::test]
    async fn test_partial_update_passes_only_supplied_optionals() {
        let mut movies = MockMovieRepository::new();
        movies
            .expect_find()
            .returning(|id| Ok(Some(movie(id, "Brazil"))));
        movies
            .expect_update()
            .withf(|id, fields| {
                id == "s1"
                    && fields.country.is_none()
                    && fields.director.is_none()
                    && fields.rating.as_deref() == Some("PG")
            })
            .times(1)
            .returning(|id, fields| {
                let mut stored = movie(id, "Brazil");
                stored.rating = fields.rating.clone();
                Ok(Some(stored))
            });

        let mut body = required_body();
        body["rating"] = json!("PG");

        let state = test_state(movies, MockUserRepository::new(), MockConfirmationMailer::new());
        let token = bearer(&state, 1);
        let (status, body) = send_json(
            create_router(state),
            json_request("PATCH", "/movies/s1", Some(&token), body),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Movie entry successfully updated.");
        assert_eq!(body["movie"]["country"], "Brazil");
        assert_eq!(body["movie"]["director"], "Someone");
        assert_eq!(body["movie"]["rating"], "PG");
    }

    #[tokio::test]
    async fn test_update_unknown_movie() {
        let mut movies = MockMovieRepository::new();
        movies.expect_find().returning(|_| Ok(None));
        movies.expect_update().never();

        let state = test_state(movies, MockUserRepository::new(), MockConfirmationMailer::new());
        let token = bearer(&state, 1);
        let (status, body) = send_json(
            create_router(state),
            json_request("PATCH", "/movies/s404", Some(&token), required_body()),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Movie entry not found.");
    }

    #[tokio::test]
    async fn test_delete_then_fetch_then_delete_again() {
        let mut movies = MockMovieRepository::new();
        let mut sequence = mockall::Sequence::new();
        movies
            .expect_delete()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|id| Ok(Some(movie(id, "Brazil"))));
        movies
            .expect_find()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(None));
        movies
            .expect_delete()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(None));

        let state = test_state(movies, MockUserRepository::new(), MockConfirmationMailer::new());
        let token = bearer(&state, 1);
        let router = create_router(state);

        let (status, body) = send_json(
            router.clone(),
            empty_request("DELETE", "/movies/s1", Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Movie entry deleted.");
        assert_eq!(body["movie"]["id"], "s1");

        let (status, _) =
            send_json(router.clone(), empty_request("GET", "/movies/s1", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) =
            send_json(router, empty_request("DELETE", "/movies/s1", Some(&token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Movie entry not found.");
    }
}
