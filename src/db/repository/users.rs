//! User repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{User, UserId};

/// Data required to create a user. The password arrives already hashed;
/// the repository never sees plaintext credentials.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub district: Option<String>,
    pub number: Option<i32>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

/// Partial profile update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub district: Option<String>,
    pub number: Option<i32>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

/// Repository trait for user accounts.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user.
    ///
    /// Returns `RepositoryError::Conflict` when the email is already taken.
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User>;

    /// Find a user by id.
    async fn find_user(&self, id: UserId) -> RepositoryResult<Option<User>>;

    /// Find a user by email (exact match).
    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    /// Apply a partial profile update and return the updated user.
    ///
    /// Returns `RepositoryError::NotFound` for an unknown id and
    /// `RepositoryError::Conflict` when the new email belongs to another user.
    async fn update_user_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> RepositoryResult<User>;

    /// Replace the stored password hash.
    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: String,
    ) -> RepositoryResult<()>;

    /// Record the public path of the uploaded logo and return the updated user.
    async fn update_logo_path(&self, id: UserId, logo_path: String) -> RepositoryResult<User>;
}
