//! Account registration, login, profile and dashboard stats.

use chrono::{Datelike, Utc};
use serde::Serialize;

use super::{ServiceError, ServiceResult};
use crate::auth;
use crate::config::AppConfig;
use crate::db::{FullRepository, NewUser, ProfileUpdate};
use crate::models::{User, UserId};

/// Minimum accepted password length, matching the registration form.
const MIN_PASSWORD_LEN: usize = 6;

/// Input for account registration. The password arrives in plaintext and
/// is hashed here; it is never stored or logged.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub district: Option<String>,
    pub number: Option<i32>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

/// Dashboard statistics for one tenant.
#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub total_clients: i64,
    pub total_quotes: i64,
    pub approved_quotes: i64,
    /// Quotes still pending or sent.
    pub open_quotes: i64,
    /// Share of approved quotes, in percent, rounded to one decimal.
    pub approval_rate: f64,
    /// Sum of quote totals issued since the start of the current month.
    pub month_total: f64,
    /// Month total divided by the all-time quote count.
    pub average_ticket: f64,
}

fn validate_email(email: &str) -> ServiceResult<()> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(ServiceError::Validation("Invalid email address".into()));
    }
    Ok(())
}

fn validate_password(password: &str) -> ServiceResult<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ServiceError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Register a new account.
///
/// Fails with a conflict when the email is already taken.
pub async fn register(repo: &dyn FullRepository, input: RegisterInput) -> ServiceResult<User> {
    if input.name.trim().is_empty() {
        return Err(ServiceError::Validation("Name is required".into()));
    }
    validate_email(&input.email)?;
    validate_password(&input.password)?;

    if repo.find_user_by_email(&input.email).await?.is_some() {
        return Err(ServiceError::Conflict("Email already registered".into()));
    }

    let password_hash = auth::hash_password(&input.password)?;
    let user = repo
        .create_user(NewUser {
            name: input.name,
            email: input.email,
            password_hash,
            phone: input.phone,
            street: input.street,
            district: input.district,
            number: input.number,
            city: input.city,
            state: input.state,
            postal_code: input.postal_code,
        })
        .await?;

    tracing::info!(user_id = %user.id, "registered new account");
    Ok(user)
}

/// Verify credentials and issue a bearer token.
///
/// A wrong email and a wrong password produce the same error, so the
/// response does not reveal which accounts exist.
pub async fn login(
    repo: &dyn FullRepository,
    config: &AppConfig,
    email: &str,
    password: &str,
) -> ServiceResult<(User, String)> {
    let user = repo
        .find_user_by_email(email)
        .await?
        .ok_or_else(|| ServiceError::InvalidCredentials("Invalid email or password".into()))?;

    if !auth::verify_password(password, &user.password_hash)? {
        return Err(ServiceError::InvalidCredentials(
            "Invalid email or password".into(),
        ));
    }

    let token = auth::issue_token(&config.jwt_secret, user.id, config.token_ttl_hours)?;
    Ok((user, token))
}

/// Fetch the authenticated user's profile.
pub async fn get_profile(repo: &dyn FullRepository, user_id: UserId) -> ServiceResult<User> {
    repo.find_user(user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found".into()))
}

/// Apply a partial profile update.
pub async fn update_profile(
    repo: &dyn FullRepository,
    user_id: UserId,
    update: ProfileUpdate,
) -> ServiceResult<User> {
    if let Some(email) = &update.email {
        validate_email(email)?;
        if let Some(existing) = repo.find_user_by_email(email).await? {
            if existing.id != user_id {
                return Err(ServiceError::Conflict("Email already registered".into()));
            }
        }
    }
    if let Some(name) = &update.name {
        if name.trim().is_empty() {
            return Err(ServiceError::Validation("Name is required".into()));
        }
    }

    Ok(repo.update_user_profile(user_id, update).await?)
}

/// Change the account password after checking the current one.
pub async fn change_password(
    repo: &dyn FullRepository,
    user_id: UserId,
    current_password: &str,
    new_password: &str,
) -> ServiceResult<()> {
    validate_password(new_password)?;

    let user = get_profile(repo, user_id).await?;
    if !auth::verify_password(current_password, &user.password_hash)? {
        return Err(ServiceError::InvalidCredentials(
            "Current password is incorrect".into(),
        ));
    }

    let new_hash = auth::hash_password(new_password)?;
    repo.update_password_hash(user_id, new_hash).await?;
    tracing::info!(user_id = %user_id, "password changed");
    Ok(())
}

/// Record the public path of a freshly uploaded logo.
pub async fn set_logo_path(
    repo: &dyn FullRepository,
    user_id: UserId,
    logo_path: String,
) -> ServiceResult<User> {
    Ok(repo.update_logo_path(user_id, logo_path).await?)
}

/// Compute the tenant's dashboard statistics.
pub async fn stats(repo: &dyn FullRepository, user_id: UserId) -> ServiceResult<UserStats> {
    let total_clients = repo.count_clients(user_id).await?;
    let counts = repo.count_quotes(user_id).await?;

    let approval_rate = if counts.total > 0 {
        round1(counts.approved as f64 / counts.total as f64 * 100.0)
    } else {
        0.0
    };

    let now = Utc::now();
    let month_start = now
        .date_naive()
        .with_day(1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(now);

    let month_total: f64 = repo
        .quotes_issued_since(user_id, month_start)
        .await?
        .iter()
        .map(|q| q.quote.total())
        .sum();

    // Averaged over all quotes ever issued, not just this month's.
    let average_ticket = if counts.total > 0 {
        month_total / counts.total as f64
    } else {
        0.0
    };

    Ok(UserStats {
        total_clients,
        total_quotes: counts.total,
        approved_quotes: counts.approved,
        open_quotes: counts.open,
        approval_rate,
        month_total,
        average_ticket,
    })
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
