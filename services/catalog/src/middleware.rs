//! Authentication middleware for session tokens

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::error;

use crate::{
    error::ApiError,
    jwt::{AuthError, JwtService, TokenIdentity},
    revocation::RevocationRegistry,
    state::AppState,
};

/// Validate a bearer token and, when enabled, check it against the
/// revocation registry
pub async fn authenticate(
    jwt: &JwtService,
    revocations: &dyn RevocationRegistry,
    check_revocation: bool,
    token: Option<&str>,
) -> Result<TokenIdentity, ApiError> {
    let token = token.ok_or(AuthError::Missing)?;
    let identity = jwt.validate(token)?;

    if check_revocation {
        let revoked = revocations
            .is_revoked(&identity.token_id)
            .await
            .map_err(|e| {
                error!("Failed to check token revocation: {}", e);
                ApiError::Internal("Error checking session.".to_string())
            })?;

        if revoked {
            return Err(AuthError::Revoked.into());
        }
    }

    Ok(identity)
}

/// Authentication middleware
///
/// On success the [`TokenIdentity`] is available to handlers as an
/// `Extension`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer.as_ref().map(|header| header.0.token());

    let identity = authenticate(
        &state.jwt,
        state.revocations.as_ref(),
        state.blacklist_enabled,
        token,
    )
    .await?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
