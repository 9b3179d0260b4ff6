use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::{claims::Claims, jwt::JwtKeys};
use crate::error::AppError;

pub const NO_TOKEN_MESSAGE: &str =
    "Access denied. No token provided. Send the header: Authorization: Bearer <token>";
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired token";

/// Bearer-token gate. Handlers taking this argument only run once the
/// token has been verified; the decoded claims live for the request only.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Expect "Bearer <token>", case-sensitive
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized(NO_TOKEN_MESSAGE.into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AppError::Unauthorized(INVALID_TOKEN_MESSAGE.into())
        })?;

        Ok(AuthUser(claims))
    }
}
