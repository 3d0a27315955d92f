use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::{errors::AppError, state::AppState, users::repo::User};

/// Authenticated caller. Extraction validates the bearer token and resolves
/// its subject to an existing user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthenticated)?;

    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .map(str::trim)
        .ok_or(AppError::Unauthenticated)?;

    if token.is_empty() {
        return Err(AppError::Unauthenticated);
    }
    Ok(token)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).map_err(|e| {
            warn!("request without bearer token");
            e
        })?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify_access(token).map_err(|e| {
            warn!(error = %e, "token rejected");
            e
        })?;

        if !User::exists(&state.db, claims.sub).await? {
            warn!(user_id = %claims.sub, "token subject does not exist");
            return Err(AppError::UnknownSubject);
        }

        Ok(AuthUser(claims.sub))
    }
}
