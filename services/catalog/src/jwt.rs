//! JWT service for session token issuance and validation
//!
//! Tokens are signed with HS256 using a process-wide secret. Each token
//! carries the user id as its subject and a random `jti`, which is the unit
//! of revocation on logout.

use anyhow::Result;
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Longest token lifetime accepted from configuration, in seconds (one year)
pub const MAX_ACCESS_TOKEN_EXPIRY: u64 = 365 * 24 * 60 * 60;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret used to sign and verify tokens
    pub secret: String,
    /// Token lifetime in seconds (default: 15 minutes)
    pub access_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET_KEY`: Signing secret (required)
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Token lifetime in seconds (default: 900,
    ///   capped at [`MAX_ACCESS_TOKEN_EXPIRY`])
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET_KEY")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET_KEY environment variable not set"))?;

        if secret.is_empty() {
            anyhow::bail!("JWT_SECRET_KEY must not be empty");
        }

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "900".to_string())
            .parse::<u64>()
            .unwrap_or(900)
            .min(MAX_ACCESS_TOKEN_EXPIRY);

        Ok(JwtConfig {
            secret,
            access_token_expiry,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Unique token id
    pub jti: String,
    /// Issued at time
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

/// Why a presented token was refused
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing authorization header.")]
    Missing,
    #[error("Invalid token.")]
    Malformed,
    #[error("Token has expired.")]
    Expired,
    #[error("You have been disconnected.")]
    Revoked,
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub token_id: String,
    pub expires_in: u64,
}

/// Identity proven by a valid token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    pub user_id: i64,
    pub token_id: String,
    /// Unix timestamp at which the token stops being valid
    pub expires_at: i64,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        JwtService {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    /// Issue a session token for a user
    pub fn issue(&self, user_id: i64) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let token_id = Uuid::new_v4().to_string();

        let lifetime = i64::try_from(self.config.access_token_expiry).unwrap_or(i64::MAX);

        let claims = Claims {
            sub: user_id.to_string(),
            jti: token_id.clone(),
            iat: now,
            exp: now.saturating_add(lifetime),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(IssuedToken {
            token,
            token_id,
            expires_in: self.config.access_token_expiry,
        })
    }

    /// Verify signature and expiry and extract the identity
    ///
    /// Revocation is not checked here; see [`crate::middleware::authenticate`].
    pub fn validate(&self, token: &str) -> Result<TokenIdentity, AuthError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::Expired,
                    _ => AuthError::Malformed,
                }
            })?;

        let claims = token_data.claims;
        let user_id = claims.sub.parse().map_err(|_| AuthError::Malformed)?;

        if claims.jti.is_empty() {
            return Err(AuthError::Malformed);
        }

        Ok(TokenIdentity {
            user_id,
            token_id: claims.jti,
            expires_at: claims.exp,
        })
    }
}
