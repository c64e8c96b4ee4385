use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use uuid::Uuid;

use crate::{
    crypto::token,
    error::{AppError, Result},
    middleware_layer::auth::CurrentSession,
    services::auth as auth_service,
    services::sessions as session_service,
    services::sessions::CreateSession,
    state::AppState,
    validation::auth::*,
};

/// The request payload for user registration.
#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
    pub name: String,
    pub username: String,
    pub password: String,
}

/// The request payload for user login.
#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// The request payload for changing a user's password.
#[derive(Deserialize, Debug)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// The response payload for authentication-related requests.
#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
}

/// The response payload carrying a freshly-issued refresh token.
#[derive(Serialize)]
pub struct TokenResponse {
    pub success: bool,
    pub refresh_token: String,
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Pulls the User-Agent header, if present.
fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Issues a refresh token and creates its session.
///
/// A unique-violation on the token hash means another request already
/// persisted a session for the same token; resolve it by looking that row
/// up instead of failing (the concurrent-duplicate case is expected).
async fn issue_session(
    state: &AppState,
    user_id: Uuid,
    user_agent: Option<String>,
    ip_address: Option<String>,
) -> Result<TokenResponse> {
    let refresh_token = token::generate_refresh_token();
    let ttl_days = state.config.session_duration_days;

    let created = session_service::create_session(
        &state.db,
        CreateSession {
            user_id,
            refresh_token: refresh_token.clone(),
            user_agent,
            ip_address,
        },
        ttl_days,
    )
    .await;

    let session = match created {
        Ok(session) => session,
        Err(e) if e.is_unique_violation() => {
            tracing::warn!("⚠️ Duplicate token hash on create; reusing existing session");
            session_service::find_by_refresh_token(&state.db, &refresh_token)
                .await?
                .ok_or(e)?
        }
        Err(e) => return Err(e),
    };

    Ok(TokenResponse {
        success: true,
        refresh_token,
        session_id: session.id,
        expires_at: session.expires_at,
    })
}

/// Handles user registration.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    tracing::info!("📝 Register attempt: {}", payload.username);
    validate_username(&payload.username)?;
    validate_password(&payload.password)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Name cannot be empty".to_string()));
    }

    let user = auth_service::create_user(
        &state.db,
        payload.name.clone(),
        payload.username.clone(),
        payload.password.clone(),
    )
    .await
    .map_err(|e| {
        if e.is_unique_violation() {
            AppError::Validation("Username already taken".to_string())
        } else {
            e
        }
    })?;

    tracing::info!("✅ User registered: {}", user.id);

    let response = issue_session(
        &state,
        user.id,
        extract_user_agent(&headers),
        Some(addr.ip().to_string()),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Handles user login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    tracing::info!("🔐 Login attempt: {}", payload.username);
    validate_username(&payload.username)?;

    let user =
        auth_service::authenticate_user(&state.db, payload.username, payload.password).await?;

    let response = issue_session(
        &state,
        user.id,
        extract_user_agent(&headers),
        Some(addr.ip().to_string()),
    )
    .await?;

    tracing::info!("✅ User logged in: {}", user.id);

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Rotates the caller's refresh token.
///
/// Issues a fresh token, re-hashes it onto the current session, and extends
/// the expiry by another rolling window. The old token stops matching the
/// moment the rotation lands.
#[axum::debug_handler]
pub async fn refresh(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Response> {
    tracing::debug!("🔄 Token refresh for session: {}", current.session_id);

    let new_token = token::generate_refresh_token();
    let ttl_days = state.config.session_duration_days;

    let expires_at = session_service::refresh_activity(
        &state.db,
        &current.session_id,
        Some(&new_token),
        ttl_days,
    )
    .await?
    .ok_or_else(|| AppError::Internal("Rotation returned no expiry".to_string()))?;

    let response = TokenResponse {
        success: true,
        refresh_token: new_token,
        session_id: current.session_id,
        expires_at,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles user logout by revoking the current session.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Response> {
    tracing::info!("👋 Logout for user: {}", current.user_id);

    session_service::revoke_session(&state.db, &current.session_id, &current.user_id).await?;

    let response = AuthResponse {
        success: true,
        message: "Logout successful".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles changing a user's password.
///
/// On success every other session of the user is revoked; only the session
/// that performed the change survives.
#[axum::debug_handler]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Response> {
    tracing::info!("🔑 Change password for user: {}", current.user_id);

    validate_password(&payload.new_password)?;

    auth_service::change_password(
        &state.db,
        current.user_id,
        payload.old_password,
        payload.new_password,
    )
    .await?;

    let revoked = session_service::revoke_all_sessions(
        &state.db,
        &current.user_id,
        Some(current.session_id),
    )
    .await?;

    tracing::info!(
        "✅ Password changed for user {}; {} other sessions revoked",
        current.user_id,
        revoked
    );

    let response = AuthResponse {
        success: true,
        message: "Password changed successfully".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
