//! Repository abstraction: traits and error types.
//!
//! The traits are split by aggregate (users, clients, quotes) and combined
//! into [`FullRepository`], which is what the application state carries as a
//! trait object.

pub mod clients;
pub mod error;
pub mod quotes;
pub mod users;

use async_trait::async_trait;

pub use clients::{ClientRepository, ClientUpdate, NewClient};
pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use quotes::{NewQuote, QuoteCounts, QuoteRepository};
pub use users::{NewUser, ProfileUpdate, UserRepository};

/// Umbrella trait implemented by every storage backend.
#[async_trait]
pub trait FullRepository: UserRepository + ClientRepository + QuoteRepository {
    /// Check that the backend is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;
}
