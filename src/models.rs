//! Core domain types for the quoting backend.
//!
//! These types are shared across the repository, service, and HTTP layers.
//! Monetary amounts are plain `f64` values; quote totals are always derived
//! from the line items and never stored independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Wrap an existing UUID.
            pub fn new(id: Uuid) -> Self {
                Self(id)
            }

            /// Generate a fresh random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Get the underlying UUID value.
            pub fn value(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a registered user (business account).
    UserId
);
uuid_id!(
    /// Identifier of a client record owned by a user.
    ClientId
);
uuid_id!(
    /// Identifier of a quote.
    QuoteId
);

/// A registered user / business account.
///
/// The password hash never leaves the backend; DTOs at the HTTP layer
/// project this struct into a hash-free profile shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub district: Option<String>,
    pub number: Option<i32>,
    pub city: Option<String>,
    /// Two-letter state code.
    pub state: Option<String>,
    pub postal_code: Option<String>,
    /// Public path of the uploaded logo (e.g. `/uploads/1712345678901.png`).
    pub logo_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle status of a client record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    #[default]
    Active,
    Inactive,
    Blocked,
}

impl ClientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Active => "active",
            ClientStatus::Inactive => "inactive",
            ClientStatus::Blocked => "blocked",
        }
    }
}

impl FromStr for ClientStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ClientStatus::Active),
            "inactive" => Ok(ClientStatus::Inactive),
            "blocked" => Ok(ClientStatus::Blocked),
            other => Err(format!("Unknown client status: {}", other)),
        }
    }
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A customer record owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub district: Option<String>,
    /// Street number, kept as free text (suites, "s/n", etc.).
    pub number: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    /// Tax identifier, unique across the whole table. Falls back to the
    /// client email when not provided at creation time.
    pub tax_id: String,
    pub status: ClientStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Workflow status of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    #[default]
    Pending,
    Sent,
    Approved,
    Rejected,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Pending => "pending",
            QuoteStatus::Sent => "sent",
            QuoteStatus::Approved => "approved",
            QuoteStatus::Rejected => "rejected",
        }
    }

    /// Statuses counted as "open" on the dashboard.
    pub fn is_open(&self) -> bool {
        matches!(self, QuoteStatus::Pending | QuoteStatus::Sent)
    }
}

impl FromStr for QuoteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(QuoteStatus::Pending),
            "sent" => Ok(QuoteStatus::Sent),
            "approved" => Ok(QuoteStatus::Approved),
            "rejected" => Ok(QuoteStatus::Rejected),
            other => Err(format!("Unknown quote status: {}", other)),
        }
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One priced line of a quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteItem {
    pub quantity: i32,
    pub description: String,
    pub unit_price: f64,
}

impl QuoteItem {
    /// Line subtotal, computed on demand.
    pub fn subtotal(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

/// A priced proposal document tied to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub client_id: ClientId,
    /// Sequential number scoped to the owning user, starting at 1.
    pub number: i32,
    pub issued_at: DateTime<Utc>,
    pub status: QuoteStatus,
    /// Line items in their original order.
    pub items: Vec<QuoteItem>,
    pub created_at: DateTime<Utc>,
}

impl Quote {
    /// Grand total, recomputed from the line items.
    pub fn total(&self) -> f64 {
        self.items.iter().map(QuoteItem::subtotal).sum()
    }
}

/// A quote joined with its client, as returned by repository list/find
/// operations so callers avoid per-row client lookups.
#[derive(Debug, Clone)]
pub struct QuoteWithClient {
    pub quote: Quote,
    pub client: Client,
}
