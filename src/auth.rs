//! Password hashing and bearer-token handling.
//!
//! Passwords are hashed with bcrypt (cost 10). Tokens are HS256 JWTs whose
//! `sub` claim carries the user id; expired and malformed tokens are
//! distinguished so the HTTP layer can return precise 401 codes.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::UserId;

/// Bcrypt work factor for newly hashed passwords.
const BCRYPT_COST: u32 = 10;

/// Errors produced by the auth layer.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The token was well-formed but past its expiry.
    #[error("Token expired")]
    TokenExpired,
    /// The token failed signature or structural validation.
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    /// Hashing or hash verification failed.
    #[error("Password hashing error: {0}")]
    Hashing(String),
    /// Token creation failed.
    #[error("Token encoding error: {0}")]
    Encoding(String),
}

/// Claims carried in issued bearer tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: Uuid,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

impl Claims {
    /// The user this token belongs to.
    pub fn user_id(&self) -> UserId {
        UserId::new(self.sub)
    }
}

/// Hash a plaintext password for storage.
pub fn hash_password(plain: &str) -> Result<String, AuthError> {
    bcrypt::hash(plain, BCRYPT_COST).map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Check a plaintext password against a stored hash.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(plain, hash).map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Issue a signed token for the given user.
pub fn issue_token(secret: &str, user_id: UserId, ttl_hours: i64) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.value(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(ttl_hours)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Encoding(e.to_string()))
}

/// Verify a token and return its claims.
///
/// Expiry is validated with the library's default leeway.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    let validation = Validation::default();

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken(e.to_string()),
    })
}
