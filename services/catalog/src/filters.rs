//! Movie list filtering
//!
//! Query parameters become SQL predicates only when their name is on the
//! configured allow-list. Column names come from [`FilterKey`], values are
//! always bound as parameters.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;

/// Movie columns that may be used as list filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKey {
    Id,
    Type,
    Title,
    Director,
    Cast,
    Country,
    ReleaseYear,
    Rating,
    Duration,
    ListedIn,
    Description,
}

impl FilterKey {
    /// Query parameter name, identical to the column name
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKey::Id => "id",
            FilterKey::Type => "type",
            FilterKey::Title => "title",
            FilterKey::Director => "director",
            FilterKey::Cast => "cast",
            FilterKey::Country => "country",
            FilterKey::ReleaseYear => "release_year",
            FilterKey::Rating => "rating",
            FilterKey::Duration => "duration",
            FilterKey::ListedIn => "listed_in",
            FilterKey::Description => "description",
        }
    }
}

/// A bound parameter of the filter query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Integer(i32),
    Text(String),
}

/// Predicates and their parameters, in placeholder order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieFilter {
    predicates: Vec<String>,
    values: Vec<FilterValue>,
}

impl MovieFilter {
    /// Build the filter from the request's query parameters
    ///
    /// Keys are visited in allow-list order; parameters that are absent,
    /// empty or not allow-listed are skipped.
    pub fn build(allowed: &[FilterKey], params: &HashMap<String, String>) -> Self {
        let mut filter = MovieFilter::default();

        for key in allowed {
            let Some(raw) = params.get(key.as_str()).filter(|value| !value.is_empty()) else {
                continue;
            };

            let placeholder = filter.values.len() + 1;
            match key {
                FilterKey::ReleaseYear => match raw.trim().parse::<i32>() {
                    Ok(year) => {
                        filter
                            .predicates
                            .push(format!("\"release_year\" = ${}", placeholder));
                        filter.values.push(FilterValue::Integer(year));
                    }
                    Err(_) => {
                        filter
                            .predicates
                            .push(format!("CAST(\"release_year\" AS TEXT) = ${}", placeholder));
                        filter.values.push(FilterValue::Text(raw.clone()));
                    }
                },
                column => {
                    filter.predicates.push(format!(
                        "UPPER(\"{}\") = UPPER(${})",
                        column.as_str(),
                        placeholder
                    ));
                    filter.values.push(FilterValue::Text(raw.clone()));
                }
            }
        }

        filter
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// `WHERE` clause with a leading space, or an empty string
    pub fn where_clause(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.predicates.join(" AND "))
        }
    }

    pub fn values(&self) -> &[FilterValue] {
        &self.values
    }
}

#[derive(Debug, Deserialize)]
struct FilterSettings {
    movies: MovieFilterSettings,
}

#[derive(Debug, Deserialize)]
struct MovieFilterSettings {
    filters: Vec<FilterKey>,
}

/// Load the allow-list
///
/// Reads `movies.filters` from the optional file at `path` (any format the
/// `config` crate recognizes, extension optional), then from
/// `CATALOG_MOVIES__FILTERS` as a comma separated list. An unknown column name
/// is an error.
pub fn load_allowed_filters(path: &str) -> Result<Vec<FilterKey>, ConfigError> {
    let settings = Config::builder()
        .set_default(
            "movies.filters",
            vec!["type", "country", "release_year", "rating", "listed_in"],
        )?
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix("CATALOG")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("movies.filters")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize::<FilterSettings>()?;

    Ok(settings.movies.filters)
}
