//! Movie model and request payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::timestamp;
use crate::validation::ValidationErrors;

/// Column widths of `tb_movie`
pub const MOVIE_ID_MAX: usize = 7;
const TYPE_MAX: usize = 10;
const TITLE_MAX: usize = 100;
const DIRECTOR_MAX: usize = 200;
const CAST_MAX: usize = 2000;
const COUNTRY_MAX: usize = 100;
const RATING_MAX: usize = 10;
const DURATION_MAX: usize = 15;
const LISTED_IN_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 9999;

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Movie {
    pub id: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub movie_type: String,
    pub title: String,
    pub director: Option<String>,
    pub cast: Option<String>,
    pub country: Option<String>,
    #[serde(serialize_with = "timestamp::serialize_option")]
    pub date_added: Option<DateTime<Utc>>,
    pub release_year: i32,
    pub rating: Option<String>,
    pub duration: Option<String>,
    pub listed_in: String,
    pub description: String,
}

/// Release year as sent by clients: a number or a numeric string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum YearInput {
    Number(i64),
    Text(String),
}

impl YearInput {
    fn to_year(&self) -> Option<i32> {
        match self {
            YearInput::Number(year) => i32::try_from(*year).ok(),
            YearInput::Text(year) => year.trim().parse().ok(),
        }
    }
}

/// Body of `POST /movies/{id}` and `PATCH /movies/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoviePayload {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub movie_type: Option<String>,
    pub title: Option<String>,
    pub director: Option<String>,
    pub cast: Option<String>,
    pub country: Option<String>,
    pub release_year: Option<YearInput>,
    pub rating: Option<String>,
    pub duration: Option<String>,
    pub listed_in: Option<String>,
    pub description: Option<String>,
}

/// Validated movie fields
///
/// On update the optional fields only overwrite stored values when they are
/// `Some`.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieFields {
    pub movie_type: String,
    pub title: String,
    pub director: Option<String>,
    pub cast: Option<String>,
    pub country: Option<String>,
    pub release_year: i32,
    pub rating: Option<String>,
    pub duration: Option<String>,
    pub listed_in: String,
    pub description: String,
}

impl MoviePayload {
    /// Check every field against the `tb_movie` schema
    ///
    /// `movie_id` is the identifier from the request path; an `id` in the
    /// body must agree with it.
    pub fn validate(self, movie_id: &str) -> Result<MovieFields, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if movie_id.is_empty() {
            errors.add("id", "The field id cannot be null.");
        }
        errors.max_length("id", Some(movie_id), MOVIE_ID_MAX);
        if self.id.as_deref().is_some_and(|body_id| body_id != movie_id) {
            errors.add("id", "The field id must match the movie id in the path.");
        }

        errors.require("type", &self.movie_type);
        errors.require("title", &self.title);
        errors.require("listed_in", &self.listed_in);
        errors.require("description", &self.description);

        let release_year = match &self.release_year {
            None => {
                errors.add("release_year", "The field release_year cannot be null.");
                None
            }
            Some(input) => {
                let year = input.to_year();
                if year.is_none() {
                    errors.add("release_year", "The field release_year must be an integer.");
                }
                year
            }
        };

        errors.max_length("type", self.movie_type.as_deref(), TYPE_MAX);
        errors.max_length("title", self.title.as_deref(), TITLE_MAX);
        errors.max_length("director", self.director.as_deref(), DIRECTOR_MAX);
        errors.max_length("cast", self.cast.as_deref(), CAST_MAX);
        errors.max_length("country", self.country.as_deref(), COUNTRY_MAX);
        errors.max_length("rating", self.rating.as_deref(), RATING_MAX);
        errors.max_length("duration", self.duration.as_deref(), DURATION_MAX);
        errors.max_length("listed_in", self.listed_in.as_deref(), LISTED_IN_MAX);
        errors.max_length("description", self.description.as_deref(), DESCRIPTION_MAX);

        match (
            self.movie_type,
            self.title,
            release_year,
            self.listed_in,
            self.description,
        ) {
            (Some(movie_type), Some(title), Some(release_year), Some(listed_in), Some(description))
                if errors.is_empty() =>
            {
                Ok(MovieFields {
                    movie_type,
                    title,
                    director: self.director,
                    cast: self.cast,
                    country: self.country,
                    release_year,
                    rating: self.rating,
                    duration: self.duration,
                    listed_in,
                    description,
                })
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> MoviePayload {
        serde_json::from_value(value).unwrap()
    }

    fn required_fields() -> serde_json::Value {
        json!({
            "type": "Movie",
            "title": "Dick Johnson Is Dead",
            "release_year": 2020,
            "listed_in": "Documentaries",
            "description": "A filmmaker stages her father's death."
        })
    }

    #[test]
    fn test_required_fields_only() {
        let fields = payload(required_fields()).validate("s1").unwrap();

        assert_eq!(fields.movie_type, "Movie");
        assert_eq!(fields.release_year, 2020);
        assert_eq!(fields.director, None);
        assert_eq!(fields.country, None);
    }

    #[test]
    fn test_release_year_accepts_numeric_string() {
        let mut body = required_fields();
        body["release_year"] = json!(" 2019 ");

        let fields = payload(body).validate("s1").unwrap();
        assert_eq!(fields.release_year, 2019);
    }

    #[test]
    fn test_reports_every_missing_field() {
        let errors = payload(json!({"title": "Only a title"}))
            .validate("s1")
            .unwrap_err();

        for field in ["type", "release_year", "listed_in", "description"] {
            assert!(errors.fields().contains_key(field), "missing error for {}", field);
        }
        assert!(!errors.fields().contains_key("title"));
    }

    #[test]
    fn test_rejects_non_numeric_year() {
        let mut body = required_fields();
        body["release_year"] = json!("twenty");

        let errors = payload(body).validate("s1").unwrap_err();
        assert_eq!(
            errors.fields()["release_year"],
            "The field release_year must be an integer."
        );
    }

    #[test]
    fn test_id_rules() {
        let errors = payload(required_fields()).validate("s12345678").unwrap_err();
        assert!(errors.fields().contains_key("id"));

        let mut body = required_fields();
        body["id"] = json!("s2");
        let errors = payload(body).validate("s1").unwrap_err();
        assert!(errors.fields().contains_key("id"));

        let mut body = required_fields();
        body["id"] = json!("s1");
        assert!(payload(body).validate("s1").is_ok());
    }

    #[test]
    fn test_column_widths() {
        let mut body = required_fields();
        body["type"] = json!("Feature Film");
        body["rating"] = json!("TV-MA-EXTENDED");

        let errors = payload(body).validate("s1").unwrap_err();
        assert!(errors.fields().contains_key("type"));
        assert!(errors.fields().contains_key("rating"));
    }

    #[test]
    fn test_serializes_type_and_date() {
        use chrono::TimeZone;

        let movie = Movie {
            id: "s1".to_string(),
            movie_type: "Movie".to_string(),
            title: "Dick Johnson Is Dead".to_string(),
            director: Some("Kirsten Johnson".to_string()),
            cast: None,
            country: Some("United States".to_string()),
            date_added: Some(Utc.with_ymd_and_hms(2021, 9, 25, 0, 0, 0).unwrap()),
            release_year: 2020,
            rating: Some("PG-13".to_string()),
            duration: Some("90 min".to_string()),
            listed_in: "Documentaries".to_string(),
            description: "A filmmaker stages her father's death.".to_string(),
        };

        let value = serde_json::to_value(&movie).unwrap();
        assert_eq!(value["type"], "Movie");
        assert_eq!(value["date_added"], "2021-09-25T00:00:00.000Z");
        assert_eq!(value["cast"], serde_json::Value::Null);
    }
}
