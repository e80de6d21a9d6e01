//! Business logic on top of the repository traits.
//!
//! Handlers never talk to a repository directly: every operation goes
//! through a service function that owns validation, credential checks,
//! tenant scoping and derived values. The functions take `&dyn
//! FullRepository` so they run unchanged against the Postgres and the
//! in-memory backends.

pub mod clients;
pub mod pdf;
pub mod quotes;
pub mod users;

use crate::auth::AuthError;
use crate::db::RepositoryError;
use pdf::PdfError;

/// Errors surfaced by the service layer.
///
/// The HTTP layer maps these onto status codes: validation and credential
/// problems become 400, missing records 404, everything else 500.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Input failed validation.
    #[error("{0}")]
    Validation(String),

    /// Login or password check failed.
    #[error("{0}")]
    InvalidCredentials(String),

    /// A uniqueness rule was violated.
    #[error("{0}")]
    Conflict(String),

    /// The requested record does not exist for this tenant.
    #[error("{0}")]
    NotFound(String),

    /// Hashing or token creation failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// PDF rendering failed.
    #[error(transparent)]
    Pdf(#[from] PdfError),

    /// The storage layer failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
