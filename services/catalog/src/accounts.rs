//! User account lifecycle
//!
//! A user is created inactive and becomes active through the link sent by
//! email. Only active users can log in. Signup is a two-step saga: the user
//! row is persisted first and removed again by `compensate_signup` when the
//! confirmation email cannot be dispatched.

use common::error::{CacheError, DatabaseError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::email::{ConfirmationMailer, EmailError};
use crate::jwt::{IssuedToken, JwtService, TokenIdentity};
use crate::models::{AccountUpdate, Credentials, NewUser, Signup, User, UserChanges};
use crate::password::{DUMMY_PASSWORD_HASH, PasswordError, hash_password, verify_password};
use crate::repositories::UserRepository;
use crate::revocation::RevocationRegistry;

/// Account operation failure
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Login {0} already exists.")]
    LoginTaken(String),

    #[error("Email {0} already exists.")]
    EmailTaken(String),

    /// Unknown login or wrong password, deliberately indistinguishable
    #[error("Login or password are invalid.")]
    InvalidCredentials,

    #[error("Inactive user.")]
    InactiveUser,

    #[error("User not found.")]
    NotFound,

    #[error("Token carries no id")]
    MissingTokenId,

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),

    #[error(transparent)]
    Hashing(#[from] PasswordError),

    #[error("Failed to sign token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Failed to send confirmation email: {0}")]
    Email(#[from] EmailError),

    #[error("Failed to record revocation: {0}")]
    Revocation(#[from] CacheError),
}

/// Result of following a confirmation link
#[derive(Debug, Clone, PartialEq)]
pub enum Confirmation {
    Activated(User),
    AlreadyActive(User),
}

/// Account operations shared by the user routes
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    mailer: Arc<dyn ConfirmationMailer>,
    jwt: JwtService,
    revocations: Arc<dyn RevocationRegistry>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        mailer: Arc<dyn ConfirmationMailer>,
        jwt: JwtService,
        revocations: Arc<dyn RevocationRegistry>,
    ) -> Self {
        Self {
            users,
            mailer,
            jwt,
            revocations,
        }
    }

    /// Register an inactive user and send the confirmation link
    pub async fn signup(&self, signup: Signup) -> Result<User, AccountError> {
        if self.users.find_by_login(&signup.login).await?.is_some() {
            return Err(AccountError::LoginTaken(signup.login));
        }
        if self.users.find_by_email(&signup.email).await?.is_some() {
            return Err(AccountError::EmailTaken(signup.email));
        }

        let new_user = NewUser {
            login: signup.login,
            password_hash: hash_password(&signup.password)?,
            email: signup.email,
        };
        let user = self.users.insert(&new_user).await?;

        if let Err(e) = self.mailer.send_confirmation(&user).await {
            self.compensate_signup(&user).await;
            return Err(e.into());
        }

        info!("User {} signed up", user.id);
        Ok(user)
    }

    /// Undo the persist step of a signup whose email could not be sent
    ///
    /// Failures are logged and swallowed; the caller reports the original
    /// email error.
    async fn compensate_signup(&self, user: &User) {
        match self.users.delete(user.id).await {
            Ok(Some(_)) => warn!("Removed user {} after failed confirmation email", user.id),
            Ok(None) => warn!("User {} was already gone during signup rollback", user.id),
            Err(e) => error!(
                "Failed to remove user {} after failed confirmation email: {}",
                user.id, e
            ),
        }
    }

    /// Activate a user. Confirming an active user changes nothing.
    pub async fn confirm(&self, id: i64) -> Result<Confirmation, AccountError> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(AccountError::NotFound)?;

        if user.active {
            return Ok(Confirmation::AlreadyActive(user));
        }

        let user = self
            .users
            .activate(id)
            .await?
            .ok_or(AccountError::NotFound)?;
        info!("User {} activated", id);
        Ok(Confirmation::Activated(user))
    }

    /// Verify credentials and issue a session token
    ///
    /// Activation is only checked once the password matched.
    pub async fn login(&self, credentials: Credentials) -> Result<IssuedToken, AccountError> {
        let Some(user) = self.users.find_by_login(&credentials.login).await? else {
            verify_password(&credentials.password, DUMMY_PASSWORD_HASH);
            return Err(AccountError::InvalidCredentials);
        };

        if !verify_password(&credentials.password, &user.password) {
            return Err(AccountError::InvalidCredentials);
        }
        if !user.active {
            return Err(AccountError::InactiveUser);
        }

        let token = self.jwt.issue(user.id)?;
        info!("User {} logged in with token {}", user.id, token.token_id);
        Ok(token)
    }

    /// Revoke the token the request was made with
    pub async fn logout(&self, session: &TokenIdentity) -> Result<(), AccountError> {
        if session.token_id.is_empty() {
            return Err(AccountError::MissingTokenId);
        }

        self.revocations
            .revoke(&session.token_id, session.expires_at)
            .await?;
        info!("User {} logged out", session.user_id);
        Ok(())
    }

    /// Change the password, and optionally email and activation, of the
    /// user named by `update.login`
    ///
    /// The password is hashed again on every call.
    pub async fn update(&self, update: AccountUpdate) -> Result<User, AccountError> {
        let user = self
            .users
            .find_by_login(&update.login)
            .await?
            .ok_or(AccountError::NotFound)?;

        let changes = UserChanges {
            password_hash: hash_password(&update.password)?,
            email: update.email,
            active: update.active,
        };

        self.users
            .update(user.id, &changes)
            .await?
            .ok_or(AccountError::NotFound)
    }

    pub async fn get(&self, id: i64) -> Result<User, AccountError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(AccountError::NotFound)
    }

    pub async fn delete(&self, id: i64) -> Result<User, AccountError> {
        let user = self
            .users
            .delete(id)
            .await?
            .ok_or(AccountError::NotFound)?;
        info!("User {} deleted", id);
        Ok(user)
    }
}
