//! Bearer-token extractor for authenticated routes.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use super::error::AppError;
use super::state::AppState;
use crate::auth::{self, AuthError};
use crate::models::UserId;

/// The authenticated user, resolved from the `Authorization` header.
///
/// Rejections are 401 responses whose code names the cause: `NO_TOKEN`
/// when the header is absent, `INVALID_TOKEN` for malformed headers or
/// bad signatures, `EXPIRED_TOKEN` past expiry.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized {
                code: "NO_TOKEN",
                message: "Missing authorization token".to_string(),
            })?;

        let token = header_value
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized {
                code: "INVALID_TOKEN",
                message: "Malformed authorization header".to_string(),
            })?;

        let claims = auth::verify_token(&state.config.jwt_secret, token).map_err(|e| match e {
            AuthError::TokenExpired => AppError::Unauthorized {
                code: "EXPIRED_TOKEN",
                message: "Token expired".to_string(),
            },
            _ => AppError::Unauthorized {
                code: "INVALID_TOKEN",
                message: "Invalid token".to_string(),
            },
        })?;

        Ok(AuthUser(claims.user_id()))
    }
}
