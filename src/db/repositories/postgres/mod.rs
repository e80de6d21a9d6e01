//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Connection health monitoring
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tokio::task;
use uuid::Uuid;

use crate::db::repository::{
    ClientRepository, ClientUpdate, ErrorContext, FullRepository, NewClient, NewQuote, NewUser,
    ProfileUpdate, QuoteCounts, QuoteRepository, RepositoryError, RepositoryResult, UserRepository,
};
use crate::models::{
    Client, ClientId, QuoteId, QuoteStatus, QuoteWithClient, User, UserId,
};

mod models;
mod schema;

use models::*;
use schema::{clients, quote_items, quotes, users};

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let max_pool_size = std::env::var("PG_POOL_MAX")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let min_pool_size = std::env::var("PG_POOL_MIN")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);

        let connection_timeout_sec = std::env::var("PG_CONN_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let idle_timeout_sec = std::env::var("PG_IDLE_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(600);

        let max_retries = std::env::var("PG_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(3);

        let retry_delay_ms = std::env::var("PG_RETRY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(100);

        Ok(Self {
            database_url,
            max_pool_size,
            min_pool_size,
            connection_timeout_sec,
            idle_timeout_sec,
            max_retries,
            retry_delay_ms,
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
///
/// This repository implementation provides:
/// - Connection pooling with configurable limits
/// - Automatic retry for transient failures
/// - Health monitoring and statistics
/// - Automatic schema migrations
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: std::sync::Arc<AtomicU64>,
    failed_queries: std::sync::Arc<AtomicU64>,
    retried_operations: std::sync::Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: std::sync::Arc::new(AtomicU64::new(0)),
            failed_queries: std::sync::Arc::new(AtomicU64::new(0)),
            retried_operations: std::sync::Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// The operation is retried up to `max_retries` times if a retryable
    /// error occurs (connection errors, serialization failures), with
    /// exponential backoff between attempts.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }
}

/// Load an owned client row, treating foreign tenants as missing.
fn load_owned_client(
    conn: &mut PgConnection,
    owner: Uuid,
    client_id: Uuid,
) -> RepositoryResult<Option<ClientRow>> {
    clients::table
        .filter(clients::id.eq(client_id))
        .filter(clients::user_id.eq(owner))
        .select(ClientRow::as_select())
        .first::<ClientRow>(conn)
        .optional()
        .map_err(RepositoryError::from)
}

/// Next per-user quote number: max over the user's quotes, plus one.
fn next_quote_number(conn: &mut PgConnection, owner: Uuid) -> RepositoryResult<i32> {
    let max: Option<i32> = quotes::table
        .inner_join(clients::table)
        .filter(clients::user_id.eq(owner))
        .select(diesel::dsl::max(quotes::number))
        .first(conn)?;
    Ok(max.unwrap_or(0) + 1)
}

/// Load item rows for a set of quotes, grouped by quote id and ordered by
/// their original position.
fn load_items_grouped(
    conn: &mut PgConnection,
    quote_ids: &[Uuid],
) -> RepositoryResult<HashMap<Uuid, Vec<QuoteItemRow>>> {
    let rows: Vec<QuoteItemRow> = quote_items::table
        .filter(quote_items::quote_id.eq_any(quote_ids.to_vec()))
        .order((quote_items::quote_id.asc(), quote_items::position.asc()))
        .select(QuoteItemRow::as_select())
        .load(conn)?;

    let mut grouped: HashMap<Uuid, Vec<QuoteItemRow>> = HashMap::new();
    for row in rows {
        grouped.entry(row.quote_id).or_default().push(row);
    }
    Ok(grouped)
}

fn assemble_quote(
    quote_row: QuoteRow,
    client_row: ClientRow,
    item_rows: Vec<QuoteItemRow>,
) -> RepositoryResult<QuoteWithClient> {
    Ok(QuoteWithClient {
        quote: quote_row.into_quote(item_rows)?,
        client: Client::try_from(client_row)?,
    })
}

/// Load one owned quote with client and items. `None` for missing or foreign.
fn load_owned_quote(
    conn: &mut PgConnection,
    owner: Uuid,
    quote_id: Uuid,
) -> RepositoryResult<Option<QuoteWithClient>> {
    let joined: Option<(QuoteRow, ClientRow)> = quotes::table
        .inner_join(clients::table)
        .filter(quotes::id.eq(quote_id))
        .filter(clients::user_id.eq(owner))
        .select((QuoteRow::as_select(), ClientRow::as_select()))
        .first(conn)
        .optional()?;

    let Some((quote_row, client_row)) = joined else {
        return Ok(None);
    };

    let mut items = load_items_grouped(conn, &[quote_id])?;
    let item_rows = items.remove(&quote_id).unwrap_or_default();
    assemble_quote(quote_row, client_row, item_rows).map(Some)
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User> {
        self.with_conn(move |conn| {
            let row = NewUserRow {
                id: Uuid::new_v4(),
                name: user.name.clone(),
                email: user.email.clone(),
                password_hash: user.password_hash.clone(),
                phone: user.phone.clone(),
                street: user.street.clone(),
                district: user.district.clone(),
                number: user.number,
                city: user.city.clone(),
                state: user.state.clone(),
                postal_code: user.postal_code.clone(),
            };

            let inserted: UserRow = diesel::insert_into(users::table)
                .values(&row)
                .returning(UserRow::as_returning())
                .get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("create_user"))?;

            Ok(User::from(inserted))
        })
        .await
    }

    async fn find_user(&self, id: UserId) -> RepositoryResult<Option<User>> {
        let id = id.value();
        self.with_conn(move |conn| {
            let row: Option<UserRow> = users::table
                .find(id)
                .select(UserRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(User::from))
        })
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let email = email.to_string();
        self.with_conn(move |conn| {
            let row: Option<UserRow> = users::table
                .filter(users::email.eq(&email))
                .select(UserRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(User::from))
        })
        .await
    }

    async fn update_user_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> RepositoryResult<User> {
        let id = id.value();
        self.with_conn(move |conn| {
            conn.transaction::<User, RepositoryError, _>(|conn| {
                let current: UserRow = users::table
                    .find(id)
                    .select(UserRow::as_select())
                    .first(conn)
                    .optional()?
                    .ok_or_else(|| {
                        RepositoryError::not_found_with_context(
                            "User not found",
                            ErrorContext::new("update_user_profile").with_entity_id(id),
                        )
                    })?;

                let updated: UserRow = diesel::update(users::table.find(id))
                    .set((
                        users::name.eq(update.name.clone().unwrap_or(current.name)),
                        users::email.eq(update.email.clone().unwrap_or(current.email)),
                        users::phone.eq(update.phone.clone().or(current.phone)),
                        users::street.eq(update.street.clone().or(current.street)),
                        users::district.eq(update.district.clone().or(current.district)),
                        users::number.eq(update.number.or(current.number)),
                        users::city.eq(update.city.clone().or(current.city)),
                        users::state.eq(update.state.clone().or(current.state)),
                        users::postal_code.eq(update.postal_code.clone().or(current.postal_code)),
                    ))
                    .returning(UserRow::as_returning())
                    .get_result(conn)
                    .map_err(|e| RepositoryError::from(e).with_operation("update_user_profile"))?;

                Ok(User::from(updated))
            })
        })
        .await
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: String,
    ) -> RepositoryResult<()> {
        let id = id.value();
        self.with_conn(move |conn| {
            let affected = diesel::update(users::table.find(id))
                .set(users::password_hash.eq(password_hash.clone()))
                .execute(conn)?;
            if affected == 0 {
                return Err(RepositoryError::not_found_with_context(
                    "User not found",
                    ErrorContext::new("update_password_hash").with_entity_id(id),
                ));
            }
            Ok(())
        })
        .await
    }

    async fn update_logo_path(&self, id: UserId, logo_path: String) -> RepositoryResult<User> {
        let id = id.value();
        self.with_conn(move |conn| {
            let updated: UserRow = diesel::update(users::table.find(id))
                .set(users::logo_path.eq(logo_path.clone()))
                .returning(UserRow::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| {
                    RepositoryError::not_found_with_context(
                        "User not found",
                        ErrorContext::new("update_logo_path").with_entity_id(id),
                    )
                })?;
            Ok(User::from(updated))
        })
        .await
    }
}

#[async_trait]
impl ClientRepository for PostgresRepository {
    async fn create_client(&self, client: NewClient) -> RepositoryResult<Client> {
        self.with_conn(move |conn| {
            let row = NewClientRow {
                id: Uuid::new_v4(),
                user_id: client.user_id.value(),
                name: client.name.clone(),
                email: client.email.clone(),
                phone: client.phone.clone(),
                street: client.street.clone(),
                district: client.district.clone(),
                number: client.number.clone(),
                city: client.city.clone(),
                state: client.state.clone(),
                postal_code: client.postal_code.clone(),
                tax_id: client.tax_id.clone(),
                status: client.status.as_str().to_string(),
                notes: client.notes.clone(),
            };

            let inserted: ClientRow = diesel::insert_into(clients::table)
                .values(&row)
                .returning(ClientRow::as_returning())
                .get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("create_client"))?;

            Client::try_from(inserted)
        })
        .await
    }

    async fn list_clients(&self, owner: UserId) -> RepositoryResult<Vec<Client>> {
        let owner = owner.value();
        self.with_conn(move |conn| {
            let rows: Vec<ClientRow> = clients::table
                .filter(clients::user_id.eq(owner))
                .order(clients::created_at.asc())
                .select(ClientRow::as_select())
                .load(conn)?;
            rows.into_iter().map(Client::try_from).collect()
        })
        .await
    }

    async fn find_client(&self, owner: UserId, id: ClientId) -> RepositoryResult<Option<Client>> {
        let owner = owner.value();
        let id = id.value();
        self.with_conn(move |conn| {
            load_owned_client(conn, owner, id)?
                .map(Client::try_from)
                .transpose()
        })
        .await
    }

    async fn update_client(
        &self,
        owner: UserId,
        id: ClientId,
        update: ClientUpdate,
    ) -> RepositoryResult<Client> {
        let owner = owner.value();
        let id = id.value();
        self.with_conn(move |conn| {
            conn.transaction::<Client, RepositoryError, _>(|conn| {
                let current = load_owned_client(conn, owner, id)?.ok_or_else(|| {
                    RepositoryError::not_found_with_context(
                        "Client not found",
                        ErrorContext::new("update_client").with_entity_id(id),
                    )
                })?;

                let status = update
                    .status
                    .map(|s| s.as_str().to_string())
                    .unwrap_or(current.status);

                let updated: ClientRow = diesel::update(clients::table.find(id))
                    .set((
                        clients::name.eq(update.name.clone().unwrap_or(current.name)),
                        clients::email.eq(update.email.clone().unwrap_or(current.email)),
                        clients::phone.eq(update.phone.clone().or(current.phone)),
                        clients::street.eq(update.street.clone().or(current.street)),
                        clients::district.eq(update.district.clone().or(current.district)),
                        clients::number.eq(update.number.clone().or(current.number)),
                        clients::city.eq(update.city.clone().or(current.city)),
                        clients::state.eq(update.state.clone().or(current.state)),
                        clients::postal_code
                            .eq(update.postal_code.clone().or(current.postal_code)),
                        clients::tax_id.eq(update.tax_id.clone().unwrap_or(current.tax_id)),
                        clients::status.eq(status),
                        clients::notes.eq(update.notes.clone().or(current.notes)),
                    ))
                    .returning(ClientRow::as_returning())
                    .get_result(conn)
                    .map_err(|e| RepositoryError::from(e).with_operation("update_client"))?;

                Client::try_from(updated)
            })
        })
        .await
    }

    async fn delete_client(&self, owner: UserId, id: ClientId) -> RepositoryResult<()> {
        let owner = owner.value();
        let id = id.value();
        self.with_conn(move |conn| {
            let affected = diesel::delete(
                clients::table
                    .filter(clients::id.eq(id))
                    .filter(clients::user_id.eq(owner)),
            )
            .execute(conn)?;
            if affected == 0 {
                return Err(RepositoryError::not_found_with_context(
                    "Client not found",
                    ErrorContext::new("delete_client").with_entity_id(id),
                ));
            }
            Ok(())
        })
        .await
    }

    async fn count_clients(&self, owner: UserId) -> RepositoryResult<i64> {
        let owner = owner.value();
        self.with_conn(move |conn| {
            let count: i64 = clients::table
                .filter(clients::user_id.eq(owner))
                .count()
                .get_result(conn)?;
            Ok(count)
        })
        .await
    }
}

#[async_trait]
impl QuoteRepository for PostgresRepository {
    async fn create_quote(
        &self,
        owner: UserId,
        quote: NewQuote,
    ) -> RepositoryResult<QuoteWithClient> {
        let owner = owner.value();
        self.with_conn(move |conn| {
            conn.transaction::<QuoteWithClient, RepositoryError, _>(|conn| {
                let client_row =
                    load_owned_client(conn, owner, quote.client_id.value())?.ok_or_else(|| {
                        RepositoryError::not_found_with_context(
                            "Client not found",
                            ErrorContext::new("create_quote")
                                .with_entity("client")
                                .with_entity_id(quote.client_id),
                        )
                    })?;

                let number = next_quote_number(conn, owner)?;

                let quote_row: QuoteRow = diesel::insert_into(quotes::table)
                    .values(&NewQuoteRow {
                        id: Uuid::new_v4(),
                        client_id: quote.client_id.value(),
                        number,
                        issued_at: quote.issued_at,
                        status: quote.status.as_str().to_string(),
                    })
                    .returning(QuoteRow::as_returning())
                    .get_result(conn)
                    .map_err(|e| RepositoryError::from(e).with_operation("create_quote"))?;

                let item_rows: Vec<NewQuoteItemRow> = quote
                    .items
                    .iter()
                    .enumerate()
                    .map(|(position, item)| NewQuoteItemRow {
                        id: Uuid::new_v4(),
                        quote_id: quote_row.id,
                        position: position as i32,
                        quantity: item.quantity,
                        description: item.description.clone(),
                        unit_price: item.unit_price,
                    })
                    .collect();

                let inserted: Vec<QuoteItemRow> = diesel::insert_into(quote_items::table)
                    .values(&item_rows)
                    .returning(QuoteItemRow::as_returning())
                    .get_results(conn)?;

                assemble_quote(quote_row, client_row, inserted)
            })
        })
        .await
    }

    async fn list_quotes(&self, owner: UserId) -> RepositoryResult<Vec<QuoteWithClient>> {
        let owner = owner.value();
        self.with_conn(move |conn| {
            let joined: Vec<(QuoteRow, ClientRow)> = quotes::table
                .inner_join(clients::table)
                .filter(clients::user_id.eq(owner))
                .order(quotes::issued_at.desc())
                .select((QuoteRow::as_select(), ClientRow::as_select()))
                .load(conn)?;

            let quote_ids: Vec<Uuid> = joined.iter().map(|(q, _)| q.id).collect();
            let mut items = load_items_grouped(conn, &quote_ids)?;

            joined
                .into_iter()
                .map(|(quote_row, client_row)| {
                    let item_rows = items.remove(&quote_row.id).unwrap_or_default();
                    assemble_quote(quote_row, client_row, item_rows)
                })
                .collect()
        })
        .await
    }

    async fn find_quote(
        &self,
        owner: UserId,
        id: QuoteId,
    ) -> RepositoryResult<Option<QuoteWithClient>> {
        let owner = owner.value();
        let id = id.value();
        self.with_conn(move |conn| load_owned_quote(conn, owner, id)).await
    }

    async fn update_quote_status(
        &self,
        owner: UserId,
        id: QuoteId,
        status: QuoteStatus,
    ) -> RepositoryResult<QuoteWithClient> {
        let owner = owner.value();
        let id = id.value();
        self.with_conn(move |conn| {
            conn.transaction::<QuoteWithClient, RepositoryError, _>(|conn| {
                let existing = load_owned_quote(conn, owner, id)?;
                if existing.is_none() {
                    return Err(RepositoryError::not_found_with_context(
                        "Quote not found",
                        ErrorContext::new("update_quote_status").with_entity_id(id),
                    ));
                }

                diesel::update(quotes::table.find(id))
                    .set(quotes::status.eq(status.as_str().to_string()))
                    .execute(conn)?;

                load_owned_quote(conn, owner, id)?.ok_or_else(|| {
                    RepositoryError::internal("Quote disappeared during status update")
                })
            })
        })
        .await
    }

    async fn delete_quote(&self, owner: UserId, id: QuoteId) -> RepositoryResult<()> {
        let owner = owner.value();
        let id = id.value();
        self.with_conn(move |conn| {
            conn.transaction::<(), RepositoryError, _>(|conn| {
                let existing = load_owned_quote(conn, owner, id)?;
                if existing.is_none() {
                    return Err(RepositoryError::not_found_with_context(
                        "Quote not found",
                        ErrorContext::new("delete_quote").with_entity_id(id),
                    ));
                }

                // Items first, then the quote, in one transaction.
                diesel::delete(quote_items::table.filter(quote_items::quote_id.eq(id)))
                    .execute(conn)?;
                diesel::delete(quotes::table.find(id)).execute(conn)?;
                Ok(())
            })
        })
        .await
    }

    async fn count_quotes(&self, owner: UserId) -> RepositoryResult<QuoteCounts> {
        let owner = owner.value();
        self.with_conn(move |conn| {
            let total: i64 = quotes::table
                .inner_join(clients::table)
                .filter(clients::user_id.eq(owner))
                .count()
                .get_result(conn)?;

            let approved: i64 = quotes::table
                .inner_join(clients::table)
                .filter(clients::user_id.eq(owner))
                .filter(quotes::status.eq(QuoteStatus::Approved.as_str()))
                .count()
                .get_result(conn)?;

            let open: i64 = quotes::table
                .inner_join(clients::table)
                .filter(clients::user_id.eq(owner))
                .filter(quotes::status.eq_any(vec![
                    QuoteStatus::Pending.as_str(),
                    QuoteStatus::Sent.as_str(),
                ]))
                .count()
                .get_result(conn)?;

            Ok(QuoteCounts {
                total,
                approved,
                open,
            })
        })
        .await
    }

    async fn quotes_issued_since(
        &self,
        owner: UserId,
        since: DateTime<Utc>,
    ) -> RepositoryResult<Vec<QuoteWithClient>> {
        let owner = owner.value();
        self.with_conn(move |conn| {
            let joined: Vec<(QuoteRow, ClientRow)> = quotes::table
                .inner_join(clients::table)
                .filter(clients::user_id.eq(owner))
                .filter(quotes::issued_at.ge(since))
                .order(quotes::issued_at.desc())
                .select((QuoteRow::as_select(), ClientRow::as_select()))
                .load(conn)?;

            let quote_ids: Vec<Uuid> = joined.iter().map(|(q, _)| q.id).collect();
            let mut items = load_items_grouped(conn, &quote_ids)?;

            joined
                .into_iter()
                .map(|(quote_row, client_row)| {
                    let item_rows = items.remove(&quote_row.id).unwrap_or_default();
                    assemble_quote(quote_row, client_row, item_rows)
                })
                .collect()
        })
        .await
    }
}

#[async_trait]
impl FullRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1").execute(conn)?;
            Ok(true)
        })
        .await
    }
}
