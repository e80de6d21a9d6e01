//! Request and response shapes for the REST API.
//!
//! DTOs keep the wire format independent from the domain types: the
//! password hash never appears in a response, and quote payloads carry
//! their derived totals so clients do not recompute them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repository::{ClientUpdate, ProfileUpdate};
use crate::models::{Client, ClientId, ClientStatus, QuoteStatus, QuoteWithClient, User};
use crate::services::clients::ClientInput;
use crate::services::quotes::{QuoteInput, QuoteItemInput};
use crate::services::users::RegisterInput;

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

// =============================================================================
// Users and auth
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub number: Option<i32>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

impl From<RegisterRequest> for RegisterInput {
    fn from(req: RegisterRequest) -> Self {
        RegisterInput {
            name: req.name,
            email: req.email,
            password: req.password,
            phone: req.phone,
            street: req.street,
            district: req.district,
            number: req.number,
            city: req.city,
            state: req.state,
            postal_code: req.postal_code,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public projection of a user account. Never carries the password hash.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
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

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            id: user.id.value(),
            name: user.name,
            email: user.email,
            phone: user.phone,
            street: user.street,
            district: user.district,
            number: user.number,
            city: user.city,
            state: user.state,
            postal_code: user.postal_code,
            logo_path: user.logo_path,
            created_at: user.created_at,
        }
    }
}

/// Response for registration and login: the account plus a bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserDto,
    pub token: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub number: Option<i32>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(req: UpdateProfileRequest) -> Self {
        ProfileUpdate {
            name: req.name,
            email: req.email,
            phone: req.phone,
            street: req.street,
            district: req.district,
            number: req.number,
            city: req.city,
            state: req.state,
            postal_code: req.postal_code,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// =============================================================================
// Clients
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub status: Option<ClientStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<CreateClientRequest> for ClientInput {
    fn from(req: CreateClientRequest) -> Self {
        ClientInput {
            name: req.name,
            email: req.email,
            phone: req.phone,
            street: req.street,
            district: req.district,
            number: req.number,
            city: req.city,
            state: req.state,
            postal_code: req.postal_code,
            tax_id: req.tax_id,
            status: req.status,
            notes: req.notes,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateClientRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub status: Option<ClientStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<UpdateClientRequest> for ClientUpdate {
    fn from(req: UpdateClientRequest) -> Self {
        ClientUpdate {
            name: req.name,
            email: req.email,
            phone: req.phone,
            street: req.street,
            district: req.district,
            number: req.number,
            city: req.city,
            state: req.state,
            postal_code: req.postal_code,
            tax_id: req.tax_id,
            status: req.status,
            notes: req.notes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClientDto {
    pub id: Uuid,
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
    pub created_at: DateTime<Utc>,
}

impl From<Client> for ClientDto {
    fn from(client: Client) -> Self {
        ClientDto {
            id: client.id.value(),
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
            created_at: client.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClientListResponse {
    pub clients: Vec<ClientDto>,
    pub total: usize,
}

// =============================================================================
// Quotes
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct QuoteItemRequest {
    pub quantity: i32,
    pub description: String,
    pub unit_price: f64,
}

#[derive(Debug, Deserialize)]
pub struct CreateQuoteRequest {
    pub client_id: Uuid,
    #[serde(default)]
    pub issued_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<QuoteStatus>,
    pub items: Vec<QuoteItemRequest>,
}

impl From<CreateQuoteRequest> for QuoteInput {
    fn from(req: CreateQuoteRequest) -> Self {
        QuoteInput {
            client_id: ClientId::new(req.client_id),
            issued_at: req.issued_at,
            status: req.status,
            items: req
                .items
                .into_iter()
                .map(|item| QuoteItemInput {
                    quantity: item.quantity,
                    description: item.description,
                    unit_price: item.unit_price,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuoteStatusRequest {
    pub status: QuoteStatus,
}

/// A quote line with its derived subtotal.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuoteItemDto {
    pub quantity: i32,
    pub description: String,
    pub unit_price: f64,
    pub subtotal: f64,
}

/// A quote with its client and derived totals.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuoteDto {
    pub id: Uuid,
    /// Sequential number scoped to the owning user.
    pub number: i32,
    pub client: ClientDto,
    pub issued_at: DateTime<Utc>,
    pub status: QuoteStatus,
    pub items: Vec<QuoteItemDto>,
    pub total: f64,
    pub created_at: DateTime<Utc>,
}

impl From<QuoteWithClient> for QuoteDto {
    fn from(joined: QuoteWithClient) -> Self {
        let total = joined.quote.total();
        let QuoteWithClient { quote, client } = joined;
        QuoteDto {
            id: quote.id.value(),
            number: quote.number,
            client: client.into(),
            issued_at: quote.issued_at,
            status: quote.status,
            items: quote
                .items
                .into_iter()
                .map(|item| {
                    let subtotal = item.subtotal();
                    QuoteItemDto {
                        quantity: item.quantity,
                        description: item.description,
                        unit_price: item.unit_price,
                        subtotal,
                    }
                })
                .collect(),
            total,
            created_at: quote.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuoteListResponse {
    pub quotes: Vec<QuoteDto>,
    pub total: usize,
}
