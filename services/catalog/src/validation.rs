//! Request payload validation
//!
//! Every payload type exposes a single `validate` function that checks all of
//! its fields and reports every violation at once, instead of stopping at the
//! first one.

use axum::{
    Json, async_trait,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use regex::Regex;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use crate::error::ApiError;

/// Field-level violations, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation. The first message recorded for a field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<&'static str, String> {
        &self.errors
    }

    /// Require a non-empty string field
    pub fn require<'a>(&mut self, field: &'static str, value: &'a Option<String>) -> Option<&'a str> {
        match value.as_deref() {
            Some(value) if !value.is_empty() => Some(value),
            _ => {
                self.add(field, format!("The field {} cannot be null.", field));
                None
            }
        }
    }

    /// Check a string against a column width
    pub fn max_length(&mut self, field: &'static str, value: Option<&str>, max: usize) {
        if let Some(value) = value {
            if value.chars().count() > max {
                self.add(
                    field,
                    format!("The field {} must be at most {} characters.", field, max),
                );
            }
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.values().map(String::as_str).collect();
        write!(f, "{}", messages.join(" "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Whether a string looks like an email address
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    regex.is_match(email)
}

/// JSON body extractor whose rejection is an [`ApiError`]
///
/// Syntax errors, wrong field types and a missing content type all become a
/// 400 with the usual `{"message": ...}` body.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| match e {
                JsonRejection::MissingJsonContentType(_) => {
                    ApiError::BadRequest("Expected a JSON request body.".to_string())
                }
                JsonRejection::JsonDataError(e) => ApiError::BadRequest(format!(
                    "Invalid request body: {}",
                    e.body_text()
                )),
                _ => ApiError::BadRequest("Malformed JSON request body.".to_string()),
            })?;

        Ok(JsonBody(value))
    }
}
