//! In-memory repository implementation for unit testing and local development.
//!
//! Uniqueness of user emails and client tax ids is enforced here the same
//! way the Postgres schema does, so tests exercise the Conflict paths
//! without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::db::repository::{
    ClientRepository, ClientUpdate, ErrorContext, FullRepository, NewClient, NewQuote, NewUser,
    ProfileUpdate, QuoteCounts, QuoteRepository, RepositoryError, RepositoryResult, UserRepository,
};
use crate::models::{
    Client, ClientId, Quote, QuoteId, QuoteStatus, QuoteWithClient, User, UserId,
};

/// In-memory repository backed by `parking_lot` locks.
#[derive(Debug, Default)]
pub struct LocalRepository {
    users: RwLock<HashMap<UserId, User>>,
    clients: RwLock<HashMap<ClientId, Client>>,
    quotes: RwLock<HashMap<QuoteId, Quote>>,
}

impl LocalRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn owned_quote(&self, owner: UserId, id: QuoteId) -> Option<QuoteWithClient> {
        let quotes = self.quotes.read();
        let quote = quotes.get(&id)?;
        let clients = self.clients.read();
        let client = clients.get(&quote.client_id)?;
        if client.user_id != owner {
            return None;
        }
        Some(QuoteWithClient {
            quote: quote.clone(),
            client: client.clone(),
        })
    }

}

#[async_trait]
impl UserRepository for LocalRepository {
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User> {
        let mut users = self.users.write();

        if users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::conflict_with_context(
                "Email already registered",
                ErrorContext::new("create_user").with_entity("user"),
            ));
        }

        let created = User {
            id: UserId::generate(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            phone: user.phone,
            street: user.street,
            district: user.district,
            number: user.number,
            city: user.city,
            state: user.state,
            postal_code: user.postal_code,
            logo_path: None,
            created_at: Utc::now(),
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_user(&self, id: UserId) -> RepositoryResult<Option<User>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_user_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> RepositoryResult<User> {
        let mut users = self.users.write();

        if let Some(ref email) = update.email {
            if users.values().any(|u| u.email == *email && u.id != id) {
                return Err(RepositoryError::conflict_with_context(
                    "Email already in use by another user",
                    ErrorContext::new("update_user_profile").with_entity_id(id),
                ));
            }
        }

        let user = users.get_mut(&id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "User not found",
                ErrorContext::new("update_user_profile").with_entity_id(id),
            )
        })?;

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(phone) = update.phone {
            user.phone = Some(phone);
        }
        if let Some(street) = update.street {
            user.street = Some(street);
        }
        if let Some(district) = update.district {
            user.district = Some(district);
        }
        if let Some(number) = update.number {
            user.number = Some(number);
        }
        if let Some(city) = update.city {
            user.city = Some(city);
        }
        if let Some(state) = update.state {
            user.state = Some(state);
        }
        if let Some(postal_code) = update.postal_code {
            user.postal_code = Some(postal_code);
        }

        Ok(user.clone())
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: String,
    ) -> RepositoryResult<()> {
        let mut users = self.users.write();
        let user = users.get_mut(&id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "User not found",
                ErrorContext::new("update_password_hash").with_entity_id(id),
            )
        })?;
        user.password_hash = password_hash;
        Ok(())
    }

    async fn update_logo_path(&self, id: UserId, logo_path: String) -> RepositoryResult<User> {
        let mut users = self.users.write();
        let user = users.get_mut(&id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "User not found",
                ErrorContext::new("update_logo_path").with_entity_id(id),
            )
        })?;
        user.logo_path = Some(logo_path);
        Ok(user.clone())
    }
}

#[async_trait]
impl ClientRepository for LocalRepository {
    async fn create_client(&self, client: NewClient) -> RepositoryResult<Client> {
        let mut clients = self.clients.write();

        if clients.values().any(|c| c.tax_id == client.tax_id) {
            return Err(RepositoryError::conflict_with_context(
                "Client already registered",
                ErrorContext::new("create_client")
                    .with_entity("client")
                    .with_details(format!("tax_id={}", client.tax_id)),
            ));
        }

        let created = Client {
            id: ClientId::generate(),
            user_id: client.user_id,
            name: client.name,
            email: client.email,
            phone: client.phone,
            street: client.street,
            district: client.district,
            number: client.number,
            city: client.city,
            state: client.state,
            postal_code: client.postal_code,
            tax_id: client.tax_id,
            status: client.status,
            notes: client.notes,
            created_at: Utc::now(),
        };
        clients.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_clients(&self, owner: UserId) -> RepositoryResult<Vec<Client>> {
        let mut result: Vec<Client> = self
            .clients
            .read()
            .values()
            .filter(|c| c.user_id == owner)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(result)
    }

    async fn find_client(&self, owner: UserId, id: ClientId) -> RepositoryResult<Option<Client>> {
        Ok(self
            .clients
            .read()
            .get(&id)
            .filter(|c| c.user_id == owner)
            .cloned())
    }

    async fn update_client(
        &self,
        owner: UserId,
        id: ClientId,
        update: ClientUpdate,
    ) -> RepositoryResult<Client> {
        let mut clients = self.clients.write();

        // Ownership resolves first so foreign ids read as missing instead
        // of leaking whether a tax id is taken.
        let owned = clients
            .get(&id)
            .map(|c| c.user_id == owner)
            .unwrap_or(false);
        if !owned {
            return Err(RepositoryError::not_found_with_context(
                "Client not found",
                ErrorContext::new("update_client").with_entity_id(id),
            ));
        }

        if let Some(ref tax_id) = update.tax_id {
            if clients.values().any(|c| c.tax_id == *tax_id && c.id != id) {
                return Err(RepositoryError::conflict_with_context(
                    "Tax id already registered",
                    ErrorContext::new("update_client").with_entity_id(id),
                ));
            }
        }

        let client = clients.get_mut(&id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "Client not found",
                ErrorContext::new("update_client").with_entity_id(id),
            )
        })?;

        if let Some(name) = update.name {
            client.name = name;
        }
        if let Some(email) = update.email {
            client.email = email;
        }
        if let Some(phone) = update.phone {
            client.phone = Some(phone);
        }
        if let Some(street) = update.street {
            client.street = Some(street);
        }
        if let Some(district) = update.district {
            client.district = Some(district);
        }
        if let Some(number) = update.number {
            client.number = Some(number);
        }
        if let Some(city) = update.city {
            client.city = Some(city);
        }
        if let Some(state) = update.state {
            client.state = Some(state);
        }
        if let Some(postal_code) = update.postal_code {
            client.postal_code = Some(postal_code);
        }
        if let Some(tax_id) = update.tax_id {
            client.tax_id = tax_id;
        }
        if let Some(status) = update.status {
            client.status = status;
        }
        if let Some(notes) = update.notes {
            client.notes = Some(notes);
        }

        Ok(client.clone())
    }

    async fn delete_client(&self, owner: UserId, id: ClientId) -> RepositoryResult<()> {
        let mut clients = self.clients.write();
        let owned = clients
            .get(&id)
            .map(|c| c.user_id == owner)
            .unwrap_or(false);
        if !owned {
            return Err(RepositoryError::not_found_with_context(
                "Client not found",
                ErrorContext::new("delete_client").with_entity_id(id),
            ));
        }
        clients.remove(&id);
        drop(clients);

        // Cascade: drop quotes referencing the client.
        self.quotes.write().retain(|_, q| q.client_id != id);
        Ok(())
    }

    async fn count_clients(&self, owner: UserId) -> RepositoryResult<i64> {
        Ok(self
            .clients
            .read()
            .values()
            .filter(|c| c.user_id == owner)
            .count() as i64)
    }
}

#[async_trait]
impl QuoteRepository for LocalRepository {
    async fn create_quote(
        &self,
        owner: UserId,
        quote: NewQuote,
    ) -> RepositoryResult<QuoteWithClient> {
        // Number allocation and insert happen under one write lock so
        // concurrent creates for the same tenant never reuse a number.
        let mut quotes = self.quotes.write();
        let clients = self.clients.read();

        let client = clients
            .get(&quote.client_id)
            .filter(|c| c.user_id == owner)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    "Client not found",
                    ErrorContext::new("create_quote").with_entity_id(quote.client_id),
                )
            })?;

        let number = quotes
            .values()
            .filter(|q| {
                clients
                    .get(&q.client_id)
                    .map(|c| c.user_id == owner)
                    .unwrap_or(false)
            })
            .map(|q| q.number)
            .max()
            .unwrap_or(0)
            + 1;
        drop(clients);

        let created = Quote {
            id: QuoteId::generate(),
            client_id: quote.client_id,
            number,
            issued_at: quote.issued_at,
            status: quote.status,
            items: quote.items,
            created_at: Utc::now(),
        };
        quotes.insert(created.id, created.clone());

        Ok(QuoteWithClient {
            quote: created,
            client,
        })
    }

    async fn list_quotes(&self, owner: UserId) -> RepositoryResult<Vec<QuoteWithClient>> {
        let quotes = self.quotes.read();
        let clients = self.clients.read();

        let mut result: Vec<QuoteWithClient> = quotes
            .values()
            .filter_map(|q| {
                let client = clients.get(&q.client_id)?;
                if client.user_id != owner {
                    return None;
                }
                Some(QuoteWithClient {
                    quote: q.clone(),
                    client: client.clone(),
                })
            })
            .collect();
        result.sort_by(|a, b| b.quote.issued_at.cmp(&a.quote.issued_at));
        Ok(result)
    }

    async fn find_quote(
        &self,
        owner: UserId,
        id: QuoteId,
    ) -> RepositoryResult<Option<QuoteWithClient>> {
        Ok(self.owned_quote(owner, id))
    }

    async fn update_quote_status(
        &self,
        owner: UserId,
        id: QuoteId,
        status: QuoteStatus,
    ) -> RepositoryResult<QuoteWithClient> {
        if self.owned_quote(owner, id).is_none() {
            return Err(RepositoryError::not_found_with_context(
                "Quote not found",
                ErrorContext::new("update_quote_status").with_entity_id(id),
            ));
        }

        let mut quotes = self.quotes.write();
        if let Some(q) = quotes.get_mut(&id) {
            q.status = status;
        }
        drop(quotes);

        self.owned_quote(owner, id).ok_or_else(|| {
            RepositoryError::internal("Quote disappeared during status update")
        })
    }

    async fn delete_quote(&self, owner: UserId, id: QuoteId) -> RepositoryResult<()> {
        if self.owned_quote(owner, id).is_none() {
            return Err(RepositoryError::not_found_with_context(
                "Quote not found",
                ErrorContext::new("delete_quote").with_entity_id(id),
            ));
        }
        // Items live inside the quote; removing the entry removes them too.
        self.quotes.write().remove(&id);
        Ok(())
    }

    async fn count_quotes(&self, owner: UserId) -> RepositoryResult<QuoteCounts> {
        let quotes = self.quotes.read();
        let clients = self.clients.read();

        let mut counts = QuoteCounts::default();
        for quote in quotes.values() {
            let owned = clients
                .get(&quote.client_id)
                .map(|c| c.user_id == owner)
                .unwrap_or(false);
            if !owned {
                continue;
            }
            counts.total += 1;
            if quote.status == QuoteStatus::Approved {
                counts.approved += 1;
            }
            if quote.status.is_open() {
                counts.open += 1;
            }
        }
        Ok(counts)
    }

    async fn quotes_issued_since(
        &self,
        owner: UserId,
        since: DateTime<Utc>,
    ) -> RepositoryResult<Vec<QuoteWithClient>> {
        let all = self.list_quotes(owner).await?;
        Ok(all
            .into_iter()
            .filter(|q| q.quote.issued_at >= since)
            .collect())
    }
}

#[async_trait]
impl FullRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}
