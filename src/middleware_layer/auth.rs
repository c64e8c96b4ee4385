use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    services::sessions as session_service,
    state::AppState,
};

/// The authenticated caller, resolved from the bearer refresh token.
///
/// Inserted as a request extension by [`require_auth`]; every session
/// handler scopes its queries to `user_id`.
#[derive(Debug, Clone, Copy)]
pub struct CurrentSession {
    /// The caller's session id.
    pub session_id: Uuid,
    /// The owning user id.
    pub user_id: Uuid,
}

/// Extracts the bearer token from the `Authorization` header.
fn extract_bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// A middleware that requires a valid session to be present.
///
/// Hashes the presented refresh token, looks up the matching valid session
/// (not revoked, not expired), records the activity, and stores the
/// resolved [`CurrentSession`] for the handlers downstream.
///
/// # Returns
///
/// A `Response` or an error `StatusCode`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    tracing::debug!("🔐 Checking authentication...");

    let token = extract_bearer_token(&request)
        .map(|t| t.to_string())
        .ok_or_else(|| {
            tracing::warn!("❌ Missing or malformed Authorization header");
            StatusCode::UNAUTHORIZED
        })?;

    let session = session_service::find_by_refresh_token(&state.db, &token)
        .await
        .map_err(|e| {
            tracing::error!("❌ Session lookup failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or_else(|| {
            tracing::warn!("❌ No valid session for presented token");
            StatusCode::UNAUTHORIZED
        })?;

    // Best-effort activity bump; an auth round trip should not fail on it.
    let ttl_days = state.config.session_duration_days;
    if let Err(e) = session_service::refresh_activity(&state.db, &session.id, None, ttl_days).await {
        tracing::warn!("⚠️ Failed to bump last_active_at for {}: {}", session.id, e);
    }

    tracing::debug!("✅ User authenticated: {}", session.user_id);

    request.extensions_mut().insert(CurrentSession {
        session_id: session.id,
        user_id: session.user_id,
    });

    Ok(next.run(request).await)
}
