//! Quote management: creation with validation, listing, status changes
//! and assembly of the printable document.

use chrono::{DateTime, Utc};

use super::pdf::{DocumentLine, DocumentParty, QuoteDocument};
use super::{ServiceError, ServiceResult};
use crate::db::{FullRepository, NewQuote};
use crate::models::{ClientId, QuoteId, QuoteItem, QuoteStatus, QuoteWithClient, UserId};

/// One line of a quote as submitted by the caller.
#[derive(Debug, Clone)]
pub struct QuoteItemInput {
    pub quantity: i32,
    pub description: String,
    pub unit_price: f64,
}

/// Input for quote creation.
#[derive(Debug, Clone)]
pub struct QuoteInput {
    pub client_id: ClientId,
    /// Defaults to now when omitted.
    pub issued_at: Option<DateTime<Utc>>,
    /// Defaults to `pending` when omitted.
    pub status: Option<QuoteStatus>,
    pub items: Vec<QuoteItemInput>,
}

fn validate_items(items: &[QuoteItemInput]) -> ServiceResult<()> {
    if items.is_empty() {
        return Err(ServiceError::Validation(
            "A quote needs at least one item".into(),
        ));
    }
    for (index, item) in items.iter().enumerate() {
        if item.quantity <= 0 {
            return Err(ServiceError::Validation(format!(
                "Item {}: quantity must be positive",
                index + 1
            )));
        }
        if item.description.trim().is_empty() {
            return Err(ServiceError::Validation(format!(
                "Item {}: description is required",
                index + 1
            )));
        }
        if !item.unit_price.is_finite() || item.unit_price < 0.0 {
            return Err(ServiceError::Validation(format!(
                "Item {}: unit price must be zero or positive",
                index + 1
            )));
        }
    }
    Ok(())
}

/// Create a quote for one of the tenant's clients.
///
/// The sequential number is allocated by the repository; a client id
/// belonging to another tenant reads as missing.
pub async fn create_quote(
    repo: &dyn FullRepository,
    owner: UserId,
    input: QuoteInput,
) -> ServiceResult<QuoteWithClient> {
    validate_items(&input.items)?;

    let quote = repo
        .create_quote(
            owner,
            NewQuote {
                client_id: input.client_id,
                issued_at: input.issued_at.unwrap_or_else(Utc::now),
                status: input.status.unwrap_or_default(),
                items: input
                    .items
                    .into_iter()
                    .map(|item| QuoteItem {
                        quantity: item.quantity,
                        description: item.description,
                        unit_price: item.unit_price,
                    })
                    .collect(),
            },
        )
        .await?;

    tracing::debug!(
        quote_id = %quote.quote.id,
        number = quote.quote.number,
        owner = %owner,
        "quote created"
    );
    Ok(quote)
}

/// List the tenant's quotes, newest first.
pub async fn list_quotes(
    repo: &dyn FullRepository,
    owner: UserId,
) -> ServiceResult<Vec<QuoteWithClient>> {
    Ok(repo.list_quotes(owner).await?)
}

/// Fetch one owned quote.
pub async fn get_quote(
    repo: &dyn FullRepository,
    owner: UserId,
    id: QuoteId,
) -> ServiceResult<QuoteWithClient> {
    repo.find_quote(owner, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Quote not found".into()))
}

/// Move an owned quote to a new workflow status.
pub async fn update_status(
    repo: &dyn FullRepository,
    owner: UserId,
    id: QuoteId,
    status: QuoteStatus,
) -> ServiceResult<QuoteWithClient> {
    Ok(repo.update_quote_status(owner, id, status).await?)
}

/// Delete an owned quote and its items.
pub async fn delete_quote(
    repo: &dyn FullRepository,
    owner: UserId,
    id: QuoteId,
) -> ServiceResult<()> {
    repo.delete_quote(owner, id).await?;
    Ok(())
}

/// Assemble the printable document for an owned quote: issuer block,
/// client block, priced lines and the derived totals.
pub async fn quote_document(
    repo: &dyn FullRepository,
    owner: UserId,
    id: QuoteId,
) -> ServiceResult<QuoteDocument> {
    let QuoteWithClient { quote, client } = get_quote(repo, owner, id).await?;
    let issuer = crate::services::users::get_profile(repo, owner).await?;

    let lines: Vec<DocumentLine> = quote
        .items
        .iter()
        .map(|item| DocumentLine {
            quantity: item.quantity,
            description: item.description.clone(),
            unit_price: item.unit_price,
            subtotal: item.subtotal(),
        })
        .collect();
    let total = quote.total();

    Ok(QuoteDocument {
        number: quote.number,
        issued_at: quote.issued_at,
        status: quote.status,
        issuer: DocumentParty {
            name: issuer.name.clone(),
            email: issuer.email,
            phone: issuer.phone,
            address: format_address(
                issuer.street.as_deref(),
                issuer.number.map(|n| n.to_string()).as_deref(),
                issuer.district.as_deref(),
                issuer.city.as_deref(),
                issuer.state.as_deref(),
                issuer.postal_code.as_deref(),
            ),
            initials: initials(&issuer.name),
        },
        client: DocumentParty {
            name: client.name.clone(),
            email: client.email,
            phone: client.phone,
            address: format_address(
                client.street.as_deref(),
                client.number.as_deref(),
                client.district.as_deref(),
                client.city.as_deref(),
                client.state.as_deref(),
                client.postal_code.as_deref(),
            ),
            initials: initials(&client.name),
        },
        lines,
        total,
    })
}

/// Up to two uppercase initials from the first words of a name.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .flat_map(|c| c.to_uppercase())
        .collect()
}

/// Single-line postal address from whichever parts are present.
fn format_address(
    street: Option<&str>,
    number: Option<&str>,
    district: Option<&str>,
    city: Option<&str>,
    state: Option<&str>,
    postal_code: Option<&str>,
) -> Option<String> {
    let street_part = match (street, number) {
        (Some(s), Some(n)) => Some(format!("{}, {}", s, n)),
        (Some(s), None) => Some(s.to_string()),
        _ => None,
    };
    let city_part = match (city, state) {
        (Some(c), Some(uf)) => Some(format!("{} - {}", c, uf)),
        (Some(c), None) => Some(c.to_string()),
        (None, Some(uf)) => Some(uf.to_string()),
        _ => None,
    };

    let parts: Vec<String> = street_part
        .into_iter()
        .chain(district.map(str::to_string))
        .chain(city_part)
        .chain(postal_code.map(str::to_string))
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}
