use chrono::{DateTime, Duration, Utc};
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::crypto::token;
use crate::device::DeviceInfo;
use crate::error::{AppError, Result};
use crate::models::session::{Session, SessionView};
use crate::repositories::session as session_repo;
use crate::validation::pagination::Pagination;

/// The stored User-Agent is capped at this many characters.
const USER_AGENT_MAX_LEN: usize = 512;

/// Input for creating a session at login.
#[derive(Debug)]
pub struct CreateSession {
    pub user_id: Uuid,
    pub refresh_token: String,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// Creates a new session for a freshly-issued refresh token.
///
/// Hashes the token, classifies the device, and persists the row with a
/// rolling `ttl_days` expiry. A unique-violation on the token hash
/// propagates to the caller, which resolves it as a lookup of the
/// existing row.
///
/// # Arguments
///
/// * `db` - The database connection pool.
/// * `input` - The session parameters.
/// * `ttl_days` - The session lifetime in days.
///
/// # Returns
///
/// A `Result` containing the persisted `Session`.
pub async fn create_session(db: &Pool, input: CreateSession, ttl_days: i64) -> Result<Session> {
    let now = Utc::now();
    let device = DeviceInfo::parse(input.user_agent.as_deref());

    let user_agent = input
        .user_agent
        .map(|ua| ua.chars().take(USER_AGENT_MAX_LEN).collect::<String>());

    let session = Session {
        id: Uuid::new_v4(),
        user_id: input.user_id,
        refresh_token_hash: token::hash_refresh_token(&input.refresh_token),
        device_info: Some(device.summary),
        user_agent,
        ip_address: input.ip_address,
        location: None,
        last_active_at: Some(now),
        expires_at: now + Duration::days(ttl_days),
        is_revoked: false,
        revoked_at: None,
        created_at: now,
    };

    session_repo::insert(db, &session).await?;
    tracing::info!("✅ Session created: {} for user {}", session.id, session.user_id);

    Ok(session)
}

/// Looks up the valid session for a plaintext refresh token.
///
/// Returns `None` when no session matches or the matching session is
/// revoked or expired; callers treat that as "invalid session", not an
/// error.
pub async fn find_by_refresh_token(db: &Pool, refresh_token: &str) -> Result<Option<Session>> {
    let hash = token::hash_refresh_token(refresh_token);
    session_repo::find_valid_by_hash(db, &hash).await
}

/// Records activity on a session.
///
/// Always bumps `last_active_at`. When a freshly-issued token is supplied,
/// also rotates the stored hash and extends the expiry by another
/// `ttl_days` (rolling-window renewal), returning the stored expiry.
/// Callers must never re-supply a token already in use; the unique index
/// rejects the collision.
pub async fn refresh_activity(
    db: &Pool,
    session_id: &Uuid,
    new_refresh_token: Option<&str>,
    ttl_days: i64,
) -> Result<Option<DateTime<Utc>>> {
    match new_refresh_token {
        Some(new_token) => {
            let new_hash = token::hash_refresh_token(new_token);
            let new_expires_at = Utc::now() + Duration::days(ttl_days);
            let stored = session_repo::rotate(db, session_id, &new_hash, new_expires_at).await?;
            tracing::debug!("🔄 Session rotated: {}", session_id);
            Ok(Some(stored))
        }
        None => {
            session_repo::touch(db, session_id).await?;
            Ok(None)
        }
    }
}

/// Revokes a single session, enforcing ownership.
///
/// # Errors
///
/// `NotFound` if the session does not exist; `Unauthorized` if it belongs
/// to a different user.
pub async fn revoke_session(db: &Pool, session_id: &Uuid, user_id: &Uuid) -> Result<()> {
    let session = session_repo::find_by_id(db, session_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if session.user_id != *user_id {
        return Err(AppError::Unauthorized);
    }

    session_repo::revoke(db, session_id).await?;
    tracing::info!("✅ Session revoked: {} for user {}", session_id, user_id);

    Ok(())
}

/// Revokes all non-revoked sessions of a user, optionally sparing one.
///
/// Used for "logout everywhere" and password-change flows. Returns the
/// number of sessions revoked.
pub async fn revoke_all_sessions(db: &Pool, user_id: &Uuid, exclude: Option<Uuid>) -> Result<u64> {
    let revoked = session_repo::revoke_all_for_user(db, user_id, exclude).await?;
    tracing::info!("✅ Revoked {} sessions for user {}", revoked, user_id);
    Ok(revoked)
}

/// Deletes every session past its expiry, revoked or not.
///
/// Revoked-but-unexpired rows are kept for audit until they expire.
/// Idempotent; intended to run on a schedule.
pub async fn cleanup_expired_sessions(db: &Pool) -> Result<u64> {
    let deleted = session_repo::delete_expired(db).await?;
    if deleted > 0 {
        tracing::info!("🧹 Cleanup removed {} expired sessions", deleted);
    }
    Ok(deleted)
}

/// Checks whether a plaintext refresh token maps to a valid session.
pub async fn is_valid_session(db: &Pool, refresh_token: &str) -> Result<bool> {
    Ok(find_by_refresh_token(db, refresh_token).await?.is_some())
}

/// Checks whether a session id is valid and owned by the given user.
///
/// Same predicate as token lookup: not revoked, not expired, owned by the
/// caller.
pub async fn is_session_valid(db: &Pool, session_id: &Uuid, user_id: &Uuid) -> Result<bool> {
    let session = session_repo::find_by_id(db, session_id).await?;
    Ok(match session {
        Some(s) => s.user_id == *user_id && s.is_valid(Utc::now()),
        None => false,
    })
}

/// Counts the currently-valid sessions of a user.
pub async fn get_session_count(db: &Pool, user_id: &Uuid) -> Result<i64> {
    session_repo::count_valid(db, user_id).await
}

/// Lists a page of a user's sessions, marking the current one.
///
/// `current_session_id` comes from the client when supplied, falling back
/// to the authenticated caller's own session.
///
/// # Returns
///
/// The page of `SessionView`s and the total number of retained sessions.
pub async fn list_sessions(
    db: &Pool,
    user_id: &Uuid,
    pagination: Pagination,
    current_session_id: Option<Uuid>,
) -> Result<(Vec<SessionView>, i64)> {
    let total = session_repo::count_for_user(db, user_id).await?;
    let sessions =
        session_repo::list_for_user(db, user_id, pagination.limit, pagination.offset()).await?;

    let views = sessions
        .into_iter()
        .map(|s| s.into_view(current_session_id))
        .collect();

    Ok((views, total))
}
