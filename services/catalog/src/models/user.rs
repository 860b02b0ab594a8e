//! User model and account request payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;
use crate::validation::{ValidationErrors, is_valid_email};

const LOGIN_MAX: usize = 50;
const EMAIL_MAX: usize = 50;

/// Stored user row
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub login: String,
    /// Argon2 PHC string
    pub password: String,
    pub email: String,
    pub active: bool,
    pub create_date: DateTime<Utc>,
    pub modify_date: Option<DateTime<Utc>>,
}

/// Public view of a user, without the password hash
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub login: String,
    pub email: String,
    pub active: bool,
    #[serde(serialize_with = "timestamp::serialize")]
    pub create_date: DateTime<Utc>,
    #[serde(serialize_with = "timestamp::serialize_option")]
    pub modify_date: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            login: user.login,
            email: user.email,
            active: user.active,
            create_date: user.create_date,
            modify_date: user.modify_date,
        }
    }
}

/// Row to insert on signup. New users are always inactive.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub login: String,
    pub password_hash: String,
    pub email: String,
}

/// Mutation applied by `PATCH /signon`
#[derive(Debug, Clone, PartialEq)]
pub struct UserChanges {
    pub password_hash: String,
    pub email: Option<String>,
    pub active: Option<bool>,
}

/// Body of `POST /signon`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupRequest {
    pub login: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
}

/// Validated signup
#[derive(Debug, Clone, PartialEq)]
pub struct Signup {
    pub login: String,
    pub password: String,
    pub email: String,
}

/// Body of `POST /login`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub login: Option<String>,
    pub password: Option<String>,
}

/// Validated login attempt
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

/// Body of `PATCH /signon`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub login: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub active: Option<bool>,
}

/// Validated account update
#[derive(Debug, Clone, PartialEq)]
pub struct AccountUpdate {
    pub login: String,
    pub password: String,
    pub email: Option<String>,
    pub active: Option<bool>,
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    errors.max_length("email", Some(email), EMAIL_MAX);
    if !is_valid_email(email) {
        errors.add("email", "The field email must be a valid email address.");
    }
}

impl SignupRequest {
    pub fn validate(self) -> Result<Signup, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        errors.require("login", &self.login);
        errors.max_length("login", self.login.as_deref(), LOGIN_MAX);
        errors.require("password", &self.password);

        match self.email.as_deref() {
            Some(email) if !email.is_empty() => check_email(&mut errors, email),
            _ => errors.add("email", "The field email is required."),
        }

        match (self.login, self.password, self.email) {
            (Some(login), Some(password), Some(email)) if errors.is_empty() => Ok(Signup {
                login,
                password,
                email,
            }),
            _ => Err(errors),
        }
    }
}

impl LoginRequest {
    pub fn validate(self) -> Result<Credentials, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("login", &self.login);
        errors.require("password", &self.password);

        match (self.login, self.password) {
            (Some(login), Some(password)) if errors.is_empty() => {
                Ok(Credentials { login, password })
            }
            _ => Err(errors),
        }
    }
}

impl UpdateUserRequest {
    pub fn validate(self) -> Result<AccountUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("login", &self.login);
        errors.require("password", &self.password);
        if let Some(email) = self.email.as_deref() {
            check_email(&mut errors, email);
        }

        match (self.login, self.password) {
            (Some(login), Some(password)) if errors.is_empty() => Ok(AccountUpdate {
                login,
                password,
                email: self.email,
                active: self.active,
            }),
            _ => Err(errors),
        }
    }
}
