//! Repositories for database operations
//!
//! Handlers and the account service only see the traits, so tests can swap
//! in mocks without a database.

use async_trait::async_trait;
use common::error::DatabaseResult;

use crate::filters::MovieFilter;
use crate::models::{Movie, MovieFields, NewUser, User, UserChanges};

pub mod movie;
pub mod user;

pub use movie::PgMovieRepository;
pub use user::PgUserRepository;

/// Storage for the movie catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MovieRepository: Send + Sync {
    /// Movies matching the filter, ordered by id
    async fn list(&self, filter: &MovieFilter) -> DatabaseResult<Vec<Movie>>;

    async fn find(&self, id: &str) -> DatabaseResult<Option<Movie>>;

    async fn insert(&self, id: &str, fields: &MovieFields) -> DatabaseResult<Movie>;

    /// Overwrite required fields, and optional fields only when `Some`
    ///
    /// Returns `None` when no movie has this id.
    async fn update(&self, id: &str, fields: &MovieFields) -> DatabaseResult<Option<Movie>>;

    /// The deleted movie, or `None` when no movie has this id
    async fn delete(&self, id: &str) -> DatabaseResult<Option<Movie>>;
}

/// Storage for user accounts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>>;

    async fn find_by_login(&self, login: &str) -> DatabaseResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    /// Insert an inactive user
    async fn insert(&self, new_user: &NewUser) -> DatabaseResult<User>;

    /// Set `active` and stamp `modify_date`
    async fn activate(&self, id: i64) -> DatabaseResult<Option<User>>;

    /// Apply `changes` and stamp `modify_date`
    async fn update(&self, id: i64, changes: &UserChanges) -> DatabaseResult<Option<User>>;

    /// The deleted user, or `None` when no user has this id
    async fn delete(&self, id: i64) -> DatabaseResult<Option<User>>;
}
