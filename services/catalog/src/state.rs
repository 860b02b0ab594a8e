//! Application state shared across handlers

use std::sync::Arc;

use crate::{
    accounts::AccountService, filters::FilterKey, jwt::JwtService,
    repositories::MovieRepository, revocation::RevocationRegistry, templates::Templates,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub movie_repository: Arc<dyn MovieRepository>,
    pub accounts: AccountService,
    pub jwt: JwtService,
    pub revocations: Arc<dyn RevocationRegistry>,
    /// Whether authenticated requests consult the revocation registry
    pub blacklist_enabled: bool,
    /// Query parameters usable as movie list filters, in predicate order
    pub movie_filters: Arc<Vec<FilterKey>>,
    pub templates: Templates,
}
