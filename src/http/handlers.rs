//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic. Tenant identity always comes from
//! the [`AuthUser`] extractor, never from the request body.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use tokio::task;
use uuid::Uuid;

use super::dto::{
    AuthResponse, ChangePasswordRequest, ClientDto, ClientListResponse, CreateClientRequest,
    CreateQuoteRequest, HealthResponse, LoginRequest, MessageResponse, QuoteDto,
    QuoteListResponse, RegisterRequest, UpdateClientRequest, UpdateProfileRequest,
    UpdateQuoteStatusRequest, UserDto,
};
use super::error::AppError;
use super::extract::AuthUser;
use super::state::AppState;
use crate::auth;
use crate::models::{ClientId, QuoteId};
use crate::services::{self, users::UserStats};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the
/// repository is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Users and auth
// =============================================================================

/// POST /v1/users/register
///
/// Create an account and return it together with a bearer token.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let user = services::users::register(state.repository.as_ref(), request.into()).await?;
    let token = auth::issue_token(&state.config.jwt_secret, user.id, state.config.token_ttl_hours)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

/// POST /v1/users/login
///
/// Verify credentials and return the account with a fresh token.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> HandlerResult<AuthResponse> {
    let (user, token) = services::users::login(
        state.repository.as_ref(),
        &state.config,
        &request.email,
        &request.password,
    )
    .await?;

    Ok(Json(AuthResponse {
        user: user.into(),
        token,
    }))
}

/// GET /v1/users/profile
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> HandlerResult<UserDto> {
    let user = services::users::get_profile(state.repository.as_ref(), user_id).await?;
    Ok(Json(user.into()))
}

/// PUT /v1/users/profile
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> HandlerResult<UserDto> {
    let user =
        services::users::update_profile(state.repository.as_ref(), user_id, request.into())
            .await?;
    Ok(Json(user.into()))
}

/// PUT /v1/users/password
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> HandlerResult<MessageResponse> {
    services::users::change_password(
        state.repository.as_ref(),
        user_id,
        &request.current_password,
        &request.new_password,
    )
    .await?;

    Ok(Json(MessageResponse {
        message: "Password updated".to_string(),
    }))
}

/// GET /v1/users/stats
pub async fn get_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> HandlerResult<UserStats> {
    let stats = services::users::stats(state.repository.as_ref(), user_id).await?;
    Ok(Json(stats))
}

/// POST /v1/users/logo
///
/// Accept a multipart image upload, store it under the uploads directory
/// with a timestamp-based name and record its public path on the profile.
pub async fn upload_logo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> HandlerResult<UserDto> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {}", e)))?
    {
        if field.name() != Some("logo") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("image/") {
            return Err(AppError::BadRequest(
                "Only image uploads are accepted".to_string(),
            ));
        }

        let extension = field
            .file_name()
            .and_then(|name| std::path::Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_else(|| "png".to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
        if data.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
        }

        let filename = format!("{}.{}", Utc::now().timestamp_millis(), extension);
        tokio::fs::create_dir_all(&state.config.uploads_dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to prepare uploads dir: {}", e)))?;
        tokio::fs::write(state.config.uploads_dir.join(&filename), &data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store upload: {}", e)))?;

        let public_path = format!("/uploads/{}", filename);
        let user =
            services::users::set_logo_path(state.repository.as_ref(), user_id, public_path)
                .await?;
        return Ok(Json(user.into()));
    }

    Err(AppError::BadRequest("Missing logo file".to_string()))
}

// =============================================================================
// Clients
// =============================================================================

/// POST /v1/clients
pub async fn create_client(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<ClientDto>), AppError> {
    let client =
        services::clients::create_client(state.repository.as_ref(), user_id, request.into())
            .await?;
    Ok((StatusCode::CREATED, Json(client.into())))
}

/// GET /v1/clients
pub async fn list_clients(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> HandlerResult<ClientListResponse> {
    let clients = services::clients::list_clients(state.repository.as_ref(), user_id).await?;
    let dtos: Vec<ClientDto> = clients.into_iter().map(Into::into).collect();
    let total = dtos.len();

    Ok(Json(ClientListResponse {
        clients: dtos,
        total,
    }))
}

/// GET /v1/clients/{id}
pub async fn get_client(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> HandlerResult<ClientDto> {
    let client =
        services::clients::get_client(state.repository.as_ref(), user_id, ClientId::new(id))
            .await?;
    Ok(Json(client.into()))
}

/// PUT /v1/clients/{id}
pub async fn update_client(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateClientRequest>,
) -> HandlerResult<ClientDto> {
    let client = services::clients::update_client(
        state.repository.as_ref(),
        user_id,
        ClientId::new(id),
        request.into(),
    )
    .await?;
    Ok(Json(client.into()))
}

/// DELETE /v1/clients/{id}
pub async fn delete_client(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> HandlerResult<MessageResponse> {
    services::clients::delete_client(state.repository.as_ref(), user_id, ClientId::new(id))
        .await?;
    Ok(Json(MessageResponse {
        message: "Client deleted".to_string(),
    }))
}

// =============================================================================
// Quotes
// =============================================================================

/// POST /v1/quotes
pub async fn create_quote(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<CreateQuoteRequest>,
) -> Result<(StatusCode, Json<QuoteDto>), AppError> {
    let quote =
        services::quotes::create_quote(state.repository.as_ref(), user_id, request.into())
            .await?;
    Ok((StatusCode::CREATED, Json(quote.into())))
}

/// GET /v1/quotes
pub async fn list_quotes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> HandlerResult<QuoteListResponse> {
    let quotes = services::quotes::list_quotes(state.repository.as_ref(), user_id).await?;
    let dtos: Vec<QuoteDto> = quotes.into_iter().map(Into::into).collect();
    let total = dtos.len();

    Ok(Json(QuoteListResponse {
        quotes: dtos,
        total,
    }))
}

/// GET /v1/quotes/{id}
pub async fn get_quote(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> HandlerResult<QuoteDto> {
    let quote =
        services::quotes::get_quote(state.repository.as_ref(), user_id, QuoteId::new(id)).await?;
    Ok(Json(quote.into()))
}

/// PUT/PATCH /v1/quotes/{id}/status
pub async fn update_quote_status(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateQuoteStatusRequest>,
) -> HandlerResult<QuoteDto> {
    let quote = services::quotes::update_status(
        state.repository.as_ref(),
        user_id,
        QuoteId::new(id),
        request.status,
    )
    .await?;
    Ok(Json(quote.into()))
}

/// DELETE /v1/quotes/{id}
pub async fn delete_quote(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> HandlerResult<MessageResponse> {
    services::quotes::delete_quote(state.repository.as_ref(), user_id, QuoteId::new(id)).await?;
    Ok(Json(MessageResponse {
        message: "Quote deleted".to_string(),
    }))
}

/// GET /v1/quotes/{id}/pdf
///
/// Render the quote as a PDF and return it inline. Rendering runs on a
/// blocking thread so the executor stays responsive.
pub async fn quote_pdf(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let document =
        services::quotes::quote_document(state.repository.as_ref(), user_id, QuoteId::new(id))
            .await?;
    let number = document.number;

    let bytes = task::spawn_blocking(move || services::pdf::render_quote_pdf(&document))
        .await
        .map_err(|e| AppError::Internal(format!("PDF task failed: {}", e)))?
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=quote_{}.pdf", number),
        ),
    ];
    Ok((headers, bytes).into_response())
}
