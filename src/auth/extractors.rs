use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::token::{TokenClaims, TokenCodec};
use crate::error::Error;
use crate::state::AppState;
use crate::users::repo_types::Role;

/// Extracts and validates the bearer token, yielding the caller's claims.
pub struct AuthUser(pub TokenClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| Error::Unauthorized("missing Authorization header".into()))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| Error::Unauthorized("invalid auth scheme".into()))?;

        let claims = TokenCodec::from_config(&state.config).validate(token)?;
        Ok(AuthUser(claims))
    }
}

/// Like [`AuthUser`] but requires the admin role.
pub struct AdminUser(pub TokenClaims);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if claims.role != Role::Admin {
            return Err(Error::Forbidden("admin role required".into()));
        }
        Ok(AdminUser(claims))
    }
}
