//! Client record management, scoped to the authenticated tenant.

use super::{ServiceError, ServiceResult};
use crate::db::{ClientUpdate, FullRepository, NewClient};
use crate::models::{Client, ClientId, ClientStatus, UserId};

/// Input for client creation. The tax id is optional; when absent the
/// client email stands in for it.
#[derive(Debug, Clone)]
pub struct ClientInput {
    pub name: String,
    pub email: String,
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

/// Create a client for the given tenant.
///
/// The tax id must be unique across all tenants; a duplicate surfaces as
/// a conflict.
pub async fn create_client(
    repo: &dyn FullRepository,
    owner: UserId,
    input: ClientInput,
) -> ServiceResult<Client> {
    if input.name.trim().is_empty() {
        return Err(ServiceError::Validation("Name is required".into()));
    }
    if input.email.trim().is_empty() {
        return Err(ServiceError::Validation("Email is required".into()));
    }

    let tax_id = input
        .tax_id
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| input.email.clone());

    let client = repo
        .create_client(NewClient {
            user_id: owner,
            name: input.name,
            email: input.email,
            phone: input.phone,
            street: input.street,
            district: input.district,
            number: input.number,
            city: input.city,
            state: input.state,
            postal_code: input.postal_code,
            tax_id,
            status: input.status.unwrap_or_default(),
            notes: input.notes,
        })
        .await?;

    tracing::debug!(client_id = %client.id, owner = %owner, "client created");
    Ok(client)
}

/// List the tenant's clients.
pub async fn list_clients(repo: &dyn FullRepository, owner: UserId) -> ServiceResult<Vec<Client>> {
    Ok(repo.list_clients(owner).await?)
}

/// Fetch one owned client.
pub async fn get_client(
    repo: &dyn FullRepository,
    owner: UserId,
    id: ClientId,
) -> ServiceResult<Client> {
    repo.find_client(owner, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Client not found".into()))
}

/// Apply a partial update to an owned client.
pub async fn update_client(
    repo: &dyn FullRepository,
    owner: UserId,
    id: ClientId,
    update: ClientUpdate,
) -> ServiceResult<Client> {
    if let Some(name) = &update.name {
        if name.trim().is_empty() {
            return Err(ServiceError::Validation("Name is required".into()));
        }
    }
    if let Some(tax_id) = &update.tax_id {
        if tax_id.trim().is_empty() {
            return Err(ServiceError::Validation("Tax id must not be empty".into()));
        }
    }

    Ok(repo.update_client(owner, id, update).await?)
}

/// Delete an owned client together with its quotes.
pub async fn delete_client(
    repo: &dyn FullRepository,
    owner: UserId,
    id: ClientId,
) -> ServiceResult<()> {
    repo.delete_client(owner, id).await?;
    tracing::debug!(client_id = %id, owner = %owner, "client deleted");
    Ok(())
}
