//! Service-layer integration tests against the in-memory repository.
//!
//! These exercise the full business logic stack (validation, hashing,
//! tenant scoping, numbering, derived totals) without going through HTTP.

use quotesmith::config::AppConfig;
use quotesmith::db::repositories::LocalRepository;
use quotesmith::db::ClientUpdate;
use quotesmith::models::{ClientStatus, QuoteStatus, UserId};
use quotesmith::services::clients::ClientInput;
use quotesmith::services::quotes::{QuoteInput, QuoteItemInput};
use quotesmith::services::users::RegisterInput;
use quotesmith::services::{clients, pdf, quotes, users, ServiceError};

fn register_input(email: &str) -> RegisterInput {
    RegisterInput {
        name: "Test Owner".to_string(),
        email: email.to_string(),
        password: "s3cret-pass".to_string(),
        phone: None,
        street: Some("Main St".to_string()),
        district: None,
        number: Some(42),
        city: Some("Springfield".to_string()),
        state: Some("IL".to_string()),
        postal_code: None,
    }
}

fn client_input(name: &str, email: &str) -> ClientInput {
    ClientInput {
        name: name.to_string(),
        email: email.to_string(),
        phone: None,
        street: None,
        district: None,
        number: None,
        city: None,
        state: None,
        postal_code: None,
        tax_id: None,
        status: None,
        notes: None,
    }
}

fn quote_input(client_id: quotesmith::models::ClientId, prices: &[f64]) -> QuoteInput {
    QuoteInput {
        client_id,
        issued_at: None,
        status: None,
        items: prices
            .iter()
            .enumerate()
            .map(|(i, price)| QuoteItemInput {
                quantity: (i + 1) as i32,
                description: format!("Service {}", i + 1),
                unit_price: *price,
            })
            .collect(),
    }
}

async fn registered_user(repo: &LocalRepository, email: &str) -> UserId {
    users::register(repo, register_input(email)).await.unwrap().id
}

// =========================================================
// Accounts
// =========================================================

#[tokio::test]
async fn register_hashes_password_and_rejects_duplicates() {
    let repo = LocalRepository::new();

    let user = users::register(&repo, register_input("owner@test.dev"))
        .await
        .unwrap();
    assert_ne!(user.password_hash, "s3cret-pass");

    let err = users::register(&repo, register_input("owner@test.dev"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn register_validates_input() {
    let repo = LocalRepository::new();

    let mut short_password = register_input("a@b.dev");
    short_password.password = "abc".to_string();
    assert!(matches!(
        users::register(&repo, short_password).await.unwrap_err(),
        ServiceError::Validation(_)
    ));

    let mut bad_email = register_input("not-an-email");
    bad_email.email = "not-an-email".to_string();
    assert!(matches!(
        users::register(&repo, bad_email).await.unwrap_err(),
        ServiceError::Validation(_)
    ));
}

#[tokio::test]
async fn login_returns_token_and_rejects_bad_credentials() {
    let repo = LocalRepository::new();
    let config = AppConfig::for_tests("login-test-secret");
    users::register(&repo, register_input("owner@test.dev"))
        .await
        .unwrap();

    let (user, token) = users::login(&repo, &config, "owner@test.dev", "s3cret-pass")
        .await
        .unwrap();
    assert!(!token.is_empty());
    assert_eq!(user.email, "owner@test.dev");

    let claims = quotesmith::auth::verify_token(&config.jwt_secret, &token).unwrap();
    assert_eq!(claims.user_id(), user.id);

    let wrong_password = users::login(&repo, &config, "owner@test.dev", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(wrong_password, ServiceError::InvalidCredentials(_)));

    let unknown_email = users::login(&repo, &config, "nobody@test.dev", "s3cret-pass")
        .await
        .unwrap_err();
    assert!(matches!(unknown_email, ServiceError::InvalidCredentials(_)));
}

#[tokio::test]
async fn change_password_requires_current_one() {
    let repo = LocalRepository::new();
    let config = AppConfig::for_tests("pw-test-secret");
    let user_id = registered_user(&repo, "owner@test.dev").await;

    let err = users::change_password(&repo, user_id, "wrong", "brand-new-pass")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredentials(_)));

    users::change_password(&repo, user_id, "s3cret-pass", "brand-new-pass")
        .await
        .unwrap();

    assert!(users::login(&repo, &config, "owner@test.dev", "s3cret-pass")
        .await
        .is_err());
    users::login(&repo, &config, "owner@test.dev", "brand-new-pass")
        .await
        .unwrap();
}

#[tokio::test]
async fn profile_update_rejects_taken_email() {
    let repo = LocalRepository::new();
    let user_id = registered_user(&repo, "first@test.dev").await;
    registered_user(&repo, "second@test.dev").await;

    let err = users::update_profile(
        &repo,
        user_id,
        quotesmith::db::ProfileUpdate {
            email: Some("second@test.dev".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    // Keeping your own email is fine.
    let updated = users::update_profile(
        &repo,
        user_id,
        quotesmith::db::ProfileUpdate {
            email: Some("first@test.dev".to_string()),
            name: Some("Renamed Owner".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.name, "Renamed Owner");
}

// =========================================================
// Clients
// =========================================================

#[tokio::test]
async fn client_tax_id_falls_back_to_email() {
    let repo = LocalRepository::new();
    let owner = registered_user(&repo, "owner@test.dev").await;

    let client = clients::create_client(&repo, owner, client_input("Jane", "jane@x.dev"))
        .await
        .unwrap();
    assert_eq!(client.tax_id, "jane@x.dev");
    assert_eq!(client.status, ClientStatus::Active);

    let mut with_tax_id = client_input("John", "john@x.dev");
    with_tax_id.tax_id = Some("12.345.678/0001-00".to_string());
    let client = clients::create_client(&repo, owner, with_tax_id).await.unwrap();
    assert_eq!(client.tax_id, "12.345.678/0001-00");
}

#[tokio::test]
async fn client_tax_id_is_unique_across_tenants() {
    let repo = LocalRepository::new();
    let first = registered_user(&repo, "first@test.dev").await;
    let second = registered_user(&repo, "second@test.dev").await;

    let mut input = client_input("Jane", "jane@x.dev");
    input.tax_id = Some("same-tax-id".to_string());
    clients::create_client(&repo, first, input.clone())
        .await
        .unwrap();

    let err = clients::create_client(&repo, second, input).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Repository(quotesmith::db::RepositoryError::Conflict { .. })
    ));
}

#[tokio::test]
async fn clients_are_invisible_across_tenants() {
    let repo = LocalRepository::new();
    let first = registered_user(&repo, "first@test.dev").await;
    let second = registered_user(&repo, "second@test.dev").await;

    let client = clients::create_client(&repo, first, client_input("Jane", "jane@x.dev"))
        .await
        .unwrap();

    assert!(clients::list_clients(&repo, second).await.unwrap().is_empty());
    assert!(matches!(
        clients::get_client(&repo, second, client.id).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
    assert!(clients::update_client(&repo, second, client.id, ClientUpdate::default())
        .await
        .is_err());
    assert!(clients::delete_client(&repo, second, client.id).await.is_err());

    // The owner still sees it.
    clients::get_client(&repo, first, client.id).await.unwrap();
}

#[tokio::test]
async fn client_update_changes_status() {
    let repo = LocalRepository::new();
    let owner = registered_user(&repo, "owner@test.dev").await;
    let client = clients::create_client(&repo, owner, client_input("Jane", "jane@x.dev"))
        .await
        .unwrap();

    let updated = clients::update_client(
        &repo,
        owner,
        client.id,
        ClientUpdate {
            status: Some(ClientStatus::Blocked),
            notes: Some("late payments".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.status, ClientStatus::Blocked);
    assert_eq!(updated.notes.as_deref(), Some("late payments"));
    assert_eq!(updated.name, "Jane");
}

// =========================================================
// Quotes
// =========================================================

#[tokio::test]
async fn quote_numbers_are_sequential_per_tenant() {
    let repo = LocalRepository::new();
    let first = registered_user(&repo, "first@test.dev").await;
    let second = registered_user(&repo, "second@test.dev").await;

    let client_a = clients::create_client(&repo, first, client_input("A", "a@x.dev"))
        .await
        .unwrap();
    let client_b = clients::create_client(&repo, second, client_input("B", "b@x.dev"))
        .await
        .unwrap();

    let q1 = quotes::create_quote(&repo, first, quote_input(client_a.id, &[10.0]))
        .await
        .unwrap();
    let q2 = quotes::create_quote(&repo, first, quote_input(client_a.id, &[20.0]))
        .await
        .unwrap();
    let other = quotes::create_quote(&repo, second, quote_input(client_b.id, &[30.0]))
        .await
        .unwrap();

    assert_eq!(q1.quote.number, 1);
    assert_eq!(q2.quote.number, 2);
    // The other tenant starts from 1 again.
    assert_eq!(other.quote.number, 1);
}

#[tokio::test]
async fn quote_totals_are_derived_from_items() {
    let repo = LocalRepository::new();
    let owner = registered_user(&repo, "owner@test.dev").await;
    let client = clients::create_client(&repo, owner, client_input("Jane", "jane@x.dev"))
        .await
        .unwrap();

    // quantities are 1 and 2, so the total is 10 + 2 * 5.5.
    let quote = quotes::create_quote(&repo, owner, quote_input(client.id, &[10.0, 5.5]))
        .await
        .unwrap();

    assert_eq!(quote.quote.items.len(), 2);
    assert_eq!(quote.quote.items[0].subtotal(), 10.0);
    assert_eq!(quote.quote.items[1].subtotal(), 11.0);
    assert_eq!(quote.quote.total(), 21.0);
    assert_eq!(quote.quote.status, QuoteStatus::Pending);
}

#[tokio::test]
async fn quote_creation_validates_items_and_ownership() {
    let repo = LocalRepository::new();
    let owner = registered_user(&repo, "owner@test.dev").await;
    let stranger = registered_user(&repo, "stranger@test.dev").await;
    let client = clients::create_client(&repo, owner, client_input("Jane", "jane@x.dev"))
        .await
        .unwrap();

    // Empty item list.
    let err = quotes::create_quote(&repo, owner, quote_input(client.id, &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    // Zero quantity.
    let mut input = quote_input(client.id, &[10.0]);
    input.items[0].quantity = 0;
    assert!(matches!(
        quotes::create_quote(&repo, owner, input).await.unwrap_err(),
        ServiceError::Validation(_)
    ));

    // Negative price.
    let mut input = quote_input(client.id, &[10.0]);
    input.items[0].unit_price = -0.5;
    assert!(matches!(
        quotes::create_quote(&repo, owner, input).await.unwrap_err(),
        ServiceError::Validation(_)
    ));

    // Someone else's client reads as missing.
    let err = quotes::create_quote(&repo, stranger, quote_input(client.id, &[10.0]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Repository(quotesmith::db::RepositoryError::NotFound { .. })
    ));
}

#[tokio::test]
async fn quote_status_updates_and_deletion() {
    let repo = LocalRepository::new();
    let owner = registered_user(&repo, "owner@test.dev").await;
    let client = clients::create_client(&repo, owner, client_input("Jane", "jane@x.dev"))
        .await
        .unwrap();
    let quote = quotes::create_quote(&repo, owner, quote_input(client.id, &[10.0]))
        .await
        .unwrap();

    let updated = quotes::update_status(&repo, owner, quote.quote.id, QuoteStatus::Approved)
        .await
        .unwrap();
    assert_eq!(updated.quote.status, QuoteStatus::Approved);
    // Items survive a status change.
    assert_eq!(updated.quote.items.len(), 1);

    quotes::delete_quote(&repo, owner, quote.quote.id).await.unwrap();
    assert!(matches!(
        quotes::get_quote(&repo, owner, quote.quote.id).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
}

#[tokio::test]
async fn deleting_a_client_removes_its_quotes() {
    let repo = LocalRepository::new();
    let owner = registered_user(&repo, "owner@test.dev").await;
    let client = clients::create_client(&repo, owner, client_input("Jane", "jane@x.dev"))
        .await
        .unwrap();
    quotes::create_quote(&repo, owner, quote_input(client.id, &[10.0]))
        .await
        .unwrap();

    clients::delete_client(&repo, owner, client.id).await.unwrap();
    assert!(quotes::list_quotes(&repo, owner).await.unwrap().is_empty());
}

// =========================================================
// Stats
// =========================================================

#[tokio::test]
async fn stats_reflect_counts_and_approval_rate() {
    let repo = LocalRepository::new();
    let owner = registered_user(&repo, "owner@test.dev").await;
    let client = clients::create_client(&repo, owner, client_input("Jane", "jane@x.dev"))
        .await
        .unwrap();

    for _ in 0..3 {
        quotes::create_quote(&repo, owner, quote_input(client.id, &[100.0]))
            .await
            .unwrap();
    }
    let quote = quotes::create_quote(&repo, owner, quote_input(client.id, &[100.0]))
        .await
        .unwrap();
    quotes::update_status(&repo, owner, quote.quote.id, QuoteStatus::Approved)
        .await
        .unwrap();

    let stats = users::stats(&repo, owner).await.unwrap();
    assert_eq!(stats.total_clients, 1);
    assert_eq!(stats.total_quotes, 4);
    assert_eq!(stats.approved_quotes, 1);
    assert_eq!(stats.open_quotes, 3);
    assert_eq!(stats.approval_rate, 25.0);
    // All four quotes were issued just now, inside the current month.
    assert_eq!(stats.month_total, 400.0);
    assert_eq!(stats.average_ticket, 100.0);
}

#[tokio::test]
async fn stats_for_a_fresh_account_are_zero() {
    let repo = LocalRepository::new();
    let owner = registered_user(&repo, "owner@test.dev").await;

    let stats = users::stats(&repo, owner).await.unwrap();
    assert_eq!(stats.total_clients, 0);
    assert_eq!(stats.total_quotes, 0);
    assert_eq!(stats.approval_rate, 0.0);
    assert_eq!(stats.average_ticket, 0.0);
}

// =========================================================
// PDF documents
// =========================================================

#[tokio::test]
async fn quote_document_renders_to_pdf() {
    let repo = LocalRepository::new();
    let owner = registered_user(&repo, "owner@test.dev").await;
    let client = clients::create_client(&repo, owner, client_input("Jane Roe", "jane@x.dev"))
        .await
        .unwrap();
    let quote = quotes::create_quote(&repo, owner, quote_input(client.id, &[10.0, 20.0]))
        .await
        .unwrap();

    let document = quotes::quote_document(&repo, owner, quote.quote.id)
        .await
        .unwrap();
    assert_eq!(document.number, 1);
    assert_eq!(document.issuer.initials, "TO");
    assert_eq!(document.client.initials, "JR");
    assert_eq!(document.lines.len(), 2);
    assert_eq!(document.total, 50.0);

    let bytes = pdf::render_quote_pdf(&document).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}
