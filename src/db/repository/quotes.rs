//! Quote repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::RepositoryResult;
use crate::models::{ClientId, QuoteId, QuoteItem, QuoteStatus, QuoteWithClient, UserId};

/// Data required to create a quote. The sequential number is allocated by
/// the repository inside the same transaction that inserts the rows.
#[derive(Debug, Clone)]
pub struct NewQuote {
    pub client_id: ClientId,
    pub issued_at: DateTime<Utc>,
    pub status: QuoteStatus,
    pub items: Vec<QuoteItem>,
}

/// Per-tenant quote counters used by the dashboard stats endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuoteCounts {
    pub total: i64,
    pub approved: i64,
    /// Quotes still open: `pending` plus `sent`.
    pub open: i64,
}

/// Repository trait for quotes and their line items.
///
/// All operations are scoped to the owning user via the client relation;
/// a quote whose client belongs to another tenant reads as missing.
#[async_trait]
pub trait QuoteRepository: Send + Sync {
    /// Insert a quote with its items.
    ///
    /// The per-user sequential number (max + 1, starting at 1) is allocated
    /// in the same transaction as the insert. Returns
    /// `RepositoryError::NotFound` when the client does not exist or is not
    /// owned by `owner`.
    async fn create_quote(&self, owner: UserId, quote: NewQuote)
        -> RepositoryResult<QuoteWithClient>;

    /// List the user's quotes with clients and items, newest `issued_at` first.
    async fn list_quotes(&self, owner: UserId) -> RepositoryResult<Vec<QuoteWithClient>>;

    /// Find a quote by id, scoped to the owner.
    async fn find_quote(
        &self,
        owner: UserId,
        id: QuoteId,
    ) -> RepositoryResult<Option<QuoteWithClient>>;

    /// Update only the status of an owned quote and return the result.
    async fn update_quote_status(
        &self,
        owner: UserId,
        id: QuoteId,
        status: QuoteStatus,
    ) -> RepositoryResult<QuoteWithClient>;

    /// Delete an owned quote together with its items.
    async fn delete_quote(&self, owner: UserId, id: QuoteId) -> RepositoryResult<()>;

    /// Tenant-scoped quote counters.
    async fn count_quotes(&self, owner: UserId) -> RepositoryResult<QuoteCounts>;

    /// The user's quotes issued at or after `since`, with items (used for
    /// month-to-date totals).
    async fn quotes_issued_since(
        &self,
        owner: UserId,
        since: DateTime<Utc>,
    ) -> RepositoryResult<Vec<QuoteWithClient>>;
}
