use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use crate::{
    error::{AppError, Result},
    models::session::Session,
};

/// The SQL twin of `Session::is_valid`: not revoked and not expired.
///
/// Every query that filters for "valid" sessions must use this fragment so
/// the predicate cannot drift between code paths.
pub const VALID_PREDICATE: &str = "is_revoked = FALSE AND expires_at > NOW()";

/// A helper function to map a `tokio_postgres::Row` to a `Session`.
fn row_to_session(row: &Row) -> Result<Session> {
    Ok(Session {
        id: row.try_get("id").map_err(|_| AppError::MissingData("id".to_string()))?,
        user_id: row.try_get("user_id").map_err(|_| AppError::MissingData("user_id".to_string()))?,
        refresh_token_hash: row.try_get("refresh_token_hash").map_err(|_| AppError::MissingData("refresh_token_hash".to_string()))?,
        device_info: row.try_get("device_info").map_err(|_| AppError::MissingData("device_info".to_string()))?,
        user_agent: row.try_get("user_agent").map_err(|_| AppError::MissingData("user_agent".to_string()))?,
        ip_address: row.try_get("ip_address").map_err(|_| AppError::MissingData("ip_address".to_string()))?,
        location: row.try_get("location").map_err(|_| AppError::MissingData("location".to_string()))?,
        last_active_at: row.try_get("last_active_at").map_err(|_| AppError::MissingData("last_active_at".to_string()))?,
        expires_at: row.try_get("expires_at").map_err(|_| AppError::MissingData("expires_at".to_string()))?,
        is_revoked: row.try_get("is_revoked").map_err(|_| AppError::MissingData("is_revoked".to_string()))?,
        revoked_at: row.try_get("revoked_at").map_err(|_| AppError::MissingData("revoked_at".to_string()))?,
        created_at: row.try_get("created_at").map_err(|_| AppError::MissingData("created_at".to_string()))?,
    })
}

/// Inserts a fully-built session row.
///
/// Propagates unique-violation errors on `refresh_token_hash`; the login
/// flow resolves those as a lookup of the existing row.
pub async fn insert(pool: &Pool, session: &Session) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            INSERT INTO sessions (
                id, user_id, refresh_token_hash, device_info, user_agent,
                ip_address, location, last_active_at, expires_at,
                is_revoked, revoked_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
            &[
                &session.id,
                &session.user_id,
                &session.refresh_token_hash,
                &session.device_info,
                &session.user_agent,
                &session.ip_address,
                &session.location,
                &session.last_active_at,
                &session.expires_at,
                &session.is_revoked,
                &session.revoked_at,
                &session.created_at,
            ],
        )
        .await?;
    Ok(())
}

/// Finds the valid session matching a refresh-token hash, if any.
pub async fn find_valid_by_hash(pool: &Pool, hash: &str) -> Result<Option<Session>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            format!(
                r#"
                SELECT *
                FROM sessions
                WHERE refresh_token_hash = $1 AND {VALID_PREDICATE}
                "#
            )
            .as_str(),
            &[&hash],
        )
        .await?;
    row.map(|r| row_to_session(&r)).transpose()
}

/// Finds a session by its ID, regardless of validity.
pub async fn find_by_id(pool: &Pool, session_id: &Uuid) -> Result<Option<Session>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT *
            FROM sessions
            WHERE id = $1
            "#,
            &[session_id],
        )
        .await?;
    row.map(|r| row_to_session(&r)).transpose()
}

/// Bumps `last_active_at` on a session.
pub async fn touch(pool: &Pool, session_id: &Uuid) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            UPDATE sessions
            SET last_active_at = NOW()
            WHERE id = $1
            "#,
            &[session_id],
        )
        .await?;
    Ok(())
}

/// Rotates the token hash and extends the expiry (rolling window),
/// bumping `last_active_at` as well.
///
/// Returns the expiry actually stored on the row, so callers report the
/// same instant the store holds.
pub async fn rotate(
    pool: &Pool,
    session_id: &Uuid,
    new_hash: &str,
    new_expires_at: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            r#"
            UPDATE sessions
            SET refresh_token_hash = $2,
                expires_at = $3,
                last_active_at = NOW()
            WHERE id = $1
            RETURNING expires_at
            "#,
            &[session_id, &new_hash, &new_expires_at],
        )
        .await?;
    row.try_get("expires_at").map_err(|_| AppError::MissingData("expires_at".to_string()))
}

/// Marks a session revoked. Re-revoking simply re-stamps `revoked_at`.
pub async fn revoke(pool: &Pool, session_id: &Uuid) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            UPDATE sessions
            SET is_revoked = TRUE, revoked_at = NOW()
            WHERE id = $1
            "#,
            &[session_id],
        )
        .await?;
    Ok(())
}

/// Revokes every non-revoked session of a user, optionally sparing one.
///
/// Returns the number of sessions flipped.
pub async fn revoke_all_for_user(
    pool: &Pool,
    user_id: &Uuid,
    exclude: Option<Uuid>,
) -> Result<u64> {
    let client = pool.get().await?;
    let affected = client
        .execute(
            r#"
            UPDATE sessions
            SET is_revoked = TRUE, revoked_at = NOW()
            WHERE user_id = $1
              AND is_revoked = FALSE
              AND ($2::uuid IS NULL OR id <> $2)
            "#,
            &[user_id, &exclude],
        )
        .await?;
    Ok(affected)
}

/// Deletes every row past its expiry, revoked or not.
///
/// Revoked-but-unexpired rows are retained for audit. Returns the number of
/// rows deleted; safe to run concurrently.
pub async fn delete_expired(pool: &Pool) -> Result<u64> {
    let client = pool.get().await?;
    let deleted = client
        .execute(
            r#"
            DELETE FROM sessions
            WHERE expires_at < NOW()
            "#,
            &[],
        )
        .await?;
    Ok(deleted)
}

/// Counts the currently-valid sessions of a user.
pub async fn count_valid(pool: &Pool, user_id: &Uuid) -> Result<i64> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            format!(
                r#"
                SELECT COUNT(*) AS count
                FROM sessions
                WHERE user_id = $1 AND {VALID_PREDICATE}
                "#
            )
            .as_str(),
            &[user_id],
        )
        .await?;
    row.try_get("count").map_err(|_| AppError::MissingData("count".to_string()))
}

/// Counts all retained sessions of a user (for pagination totals).
pub async fn count_for_user(pool: &Pool, user_id: &Uuid) -> Result<i64> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            r#"
            SELECT COUNT(*) AS count
            FROM sessions
            WHERE user_id = $1
            "#,
            &[user_id],
        )
        .await?;
    row.try_get("count").map_err(|_| AppError::MissingData("count".to_string()))
}

/// Lists a page of a user's sessions, most recently active first.
pub async fn list_for_user(
    pool: &Pool,
    user_id: &Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Session>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT *
            FROM sessions
            WHERE user_id = $1
            ORDER BY last_active_at DESC NULLS LAST, created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            &[user_id, &limit, &offset],
        )
        .await?;
    rows.iter().map(row_to_session).collect()
}
