//! Row structs mapping the Diesel schema to the domain types.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{clients, quote_items, quotes, users};
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::models::{
    Client, ClientId, ClientStatus, Quote, QuoteId, QuoteItem, QuoteStatus, User, UserId,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
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
    pub logo_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::new(row.id),
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            phone: row.phone,
            street: row.street,
            district: row.district,
            number: row.number,
            city: row.city,
            state: row.state,
            postal_code: row.postal_code,
            logo_path: row.logo_path,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    pub id: Uuid,
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

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = clients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ClientRow {
    pub id: Uuid,
    pub user_id: Uuid,
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
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ClientRow> for Client {
    type Error = RepositoryError;

    fn try_from(row: ClientRow) -> RepositoryResult<Client> {
        let status: ClientStatus = row
            .status
            .parse()
            .map_err(|e: String| RepositoryError::internal(e))?;
        Ok(Client {
            id: ClientId::new(row.id),
            user_id: UserId::new(row.user_id),
            name: row.name,
            email: row.email,
            phone: row.phone,
            street: row.street,
            district: row.district,
            number: row.number,
            city: row.city,
            state: row.state,
            postal_code: row.postal_code,
            tax_id: row.tax_id,
            status,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = clients)]
pub struct NewClientRow {
    pub id: Uuid,
    pub user_id: Uuid,
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
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = quotes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct QuoteRow {
    pub id: Uuid,
    pub client_id: Uuid,
    pub number: i32,
    pub issued_at: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl QuoteRow {
    /// Combine a quote row with its item rows into a domain quote.
    pub fn into_quote(self, item_rows: Vec<QuoteItemRow>) -> RepositoryResult<Quote> {
        let status: QuoteStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::internal(e))?;
        Ok(Quote {
            id: QuoteId::new(self.id),
            client_id: ClientId::new(self.client_id),
            number: self.number,
            issued_at: self.issued_at,
            status,
            items: item_rows.into_iter().map(QuoteItem::from).collect(),
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = quotes)]
pub struct NewQuoteRow {
    pub id: Uuid,
    pub client_id: Uuid,
    pub number: i32,
    pub issued_at: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = quote_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct QuoteItemRow {
    pub id: Uuid,
    pub quote_id: Uuid,
    pub position: i32,
    pub quantity: i32,
    pub description: String,
    pub unit_price: f64,
}

impl From<QuoteItemRow> for QuoteItem {
    fn from(row: QuoteItemRow) -> Self {
        QuoteItem {
            quantity: row.quantity,
            description: row.description,
            unit_price: row.unit_price,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = quote_items)]
pub struct NewQuoteItemRow {
    pub id: Uuid,
    pub quote_id: Uuid,
    pub position: i32,
    pub quantity: i32,
    pub description: String,
    pub unit_price: f64,
}
