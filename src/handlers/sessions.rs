use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::Result,
    middleware_layer::auth::CurrentSession,
    models::session::SessionView,
    services::sessions as session_service,
    state::AppState,
    validation::pagination::Pagination,
};

/// Query parameters for the session listing.
///
/// `page` and `limit` arrive as raw strings so they can be coerced (never
/// rejected); `current_session_id` is parsed leniently and ignored when
/// malformed.
#[derive(Deserialize, Debug, Default)]
pub struct ListSessionsParams {
    pub current_session_id: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// The response payload for the session listing.
#[derive(Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionView>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// The response payload for a single-session revocation.
#[derive(Serialize)]
pub struct RevokeResponse {
    pub success: bool,
    pub message: String,
}

/// The response payload for a bulk revocation.
#[derive(Serialize)]
pub struct RevokeAllResponse {
    pub success: bool,
    pub revoked_count: u64,
}

/// The response payload for the valid-session count.
#[derive(Serialize)]
pub struct SessionCountResponse {
    pub count: i64,
}

/// The response payload for the validity probe.
#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
}

/// Lists the caller's sessions, paginated, marking the current one.
///
/// The current session is the one named by `current_session_id` when the
/// client supplies it, otherwise the session that authenticated this
/// request.
#[axum::debug_handler]
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Query(params): Query<ListSessionsParams>,
) -> Result<Response> {
    let pagination = Pagination::from_params(params.page.as_deref(), params.limit.as_deref());

    let current_marker = params
        .current_session_id
        .as_deref()
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or(current.session_id);

    tracing::debug!(
        "📋 Listing sessions for user {} (page {}, limit {})",
        current.user_id,
        pagination.page,
        pagination.limit
    );

    let (sessions, total) = session_service::list_sessions(
        &state.db,
        &current.user_id,
        pagination,
        Some(current_marker),
    )
    .await?;

    let response = SessionListResponse {
        sessions,
        total,
        page: pagination.page,
        limit: pagination.limit,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Revokes one of the caller's sessions.
///
/// `NotFound` when the id doesn't exist; `Forbidden` when it belongs to
/// another user.
#[axum::debug_handler]
pub async fn revoke_session(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(session_id): Path<Uuid>,
) -> Result<Response> {
    session_service::revoke_session(&state.db, &session_id, &current.user_id).await?;

    let response = RevokeResponse {
        success: true,
        message: "Session revoked".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Revokes all of the caller's sessions except the current one.
#[axum::debug_handler]
pub async fn revoke_all_sessions(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Response> {
    let revoked_count = session_service::revoke_all_sessions(
        &state.db,
        &current.user_id,
        Some(current.session_id),
    )
    .await?;

    let response = RevokeAllResponse {
        success: true,
        revoked_count,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Counts the caller's currently-valid sessions.
#[axum::debug_handler]
pub async fn session_count(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Response> {
    let count = session_service::get_session_count(&state.db, &current.user_id).await?;

    Ok((StatusCode::OK, Json(SessionCountResponse { count })).into_response())
}

/// Boolean validity probe for one of the caller's sessions.
///
/// Applies the same predicate as token lookup: not revoked, not expired,
/// owned by the caller.
#[axum::debug_handler]
pub async fn validate_session(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(session_id): Path<Uuid>,
) -> Result<Response> {
    let valid =
        session_service::is_session_valid(&state.db, &session_id, &current.user_id).await?;

    Ok((StatusCode::OK, Json(ValidateResponse { valid })).into_response())
}
