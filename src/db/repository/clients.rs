//! Client repository trait.
//!
//! Every operation is scoped to the owning user: a client belonging to a
//! different tenant behaves exactly like a missing record.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Client, ClientId, ClientStatus, UserId};

/// Data required to create a client. `tax_id` is already resolved by the
/// service layer (falling back to the email when absent).
#[derive(Debug, Clone)]
pub struct NewClient {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub district: Option<String>,
    pub number: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub tax_id: String,
    pub status: ClientStatus,
    pub notes: Option<String>,
}

/// Partial client update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub district: Option<String>,
    pub number: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub tax_id: Option<String>,
    pub status: Option<ClientStatus>,
    pub notes: Option<String>,
}

/// Repository trait for client records.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Insert a new client.
    ///
    /// Returns `RepositoryError::Conflict` when the tax id is already
    /// registered (by any tenant; the column is globally unique).
    async fn create_client(&self, client: NewClient) -> RepositoryResult<Client>;

    /// List all clients owned by the given user.
    async fn list_clients(&self, owner: UserId) -> RepositoryResult<Vec<Client>>;

    /// Find a client by id, scoped to the owner.
    async fn find_client(&self, owner: UserId, id: ClientId) -> RepositoryResult<Option<Client>>;

    /// Apply a partial update to an owned client and return the result.
    ///
    /// Returns `RepositoryError::NotFound` when the client does not exist or
    /// belongs to another user.
    async fn update_client(
        &self,
        owner: UserId,
        id: ClientId,
        update: ClientUpdate,
    ) -> RepositoryResult<Client>;

    /// Delete an owned client.
    async fn delete_client(&self, owner: UserId, id: ClientId) -> RepositoryResult<()>;

    /// Count the clients owned by the given user.
    async fn count_clients(&self, owner: UserId) -> RepositoryResult<i64>;
}
