//! Store-level tests for the session sweep and token rotation.
//!
//! These run against a real Postgres pointed at by `DATABASE_URL` and are
//! ignored by default. Run with:
//!
//! ```sh
//! cargo test --test session_store_test -- --ignored
//! ```

use chrono::{Duration, Utc};
use deadpool_postgres::Pool;
use uuid::Uuid;

use bitloot_sessions::{
    crypto::token,
    db,
    models::session::Session,
    repositories::session as session_repo,
    repositories::user as user_repo,
    services::sessions as session_service,
};

/// Connects to the test database and applies the schema.
async fn test_pool() -> Pool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = db::create_pool(&database_url).expect("Failed to create pool");
    db::init_schema(&pool).await.expect("Failed to apply schema");
    pool
}

/// Creates a throwaway user; its sessions cascade on delete.
async fn create_test_user(pool: &Pool) -> Uuid {
    let id = Uuid::new_v4();
    let username = format!("store_test_{}", &id.simple().to_string()[..12]);
    user_repo::create_user(
        pool,
        id,
        "Store Test".to_string(),
        username,
        "not-a-real-hash".to_string(),
    )
    .await
    .expect("Failed to create test user");
    id
}

async fn delete_test_user(pool: &Pool, user_id: Uuid) {
    let client = pool.get().await.expect("Failed to get client");
    client
        .execute("DELETE FROM users WHERE id = $1", &[&user_id])
        .await
        .expect("Failed to delete test user");
}

/// Builds a session row with an arbitrary expiry and revocation state.
fn build_session(user_id: Uuid, expires_at: chrono::DateTime<Utc>, is_revoked: bool) -> Session {
    let now = Utc::now();
    Session {
        id: Uuid::new_v4(),
        user_id,
        refresh_token_hash: token::hash_refresh_token(&token::generate_refresh_token()),
        device_info: Some("Chrome on Windows".to_string()),
        user_agent: None,
        ip_address: None,
        location: None,
        last_active_at: Some(now),
        expires_at,
        is_revoked,
        revoked_at: if is_revoked { Some(now) } else { None },
        created_at: now,
    }
}

#[tokio::test]
#[ignore = "requires Postgres on DATABASE_URL"]
async fn cleanup_deletes_expired_and_keeps_revoked_unexpired() {
    let pool = test_pool().await;
    let user_id = create_test_user(&pool).await;

    let now = Utc::now();
    let expired = build_session(user_id, now - Duration::hours(1), false);
    let revoked_unexpired = build_session(user_id, now + Duration::days(7), true);
    let valid = build_session(user_id, now + Duration::days(7), false);

    session_repo::insert(&pool, &expired).await.unwrap();
    session_repo::insert(&pool, &revoked_unexpired).await.unwrap();
    session_repo::insert(&pool, &valid).await.unwrap();

    session_service::cleanup_expired_sessions(&pool)
        .await
        .expect("Cleanup failed");

    // Only the expired row is swept; revoked-but-unexpired stays for audit.
    assert!(session_repo::find_by_id(&pool, &expired.id)
        .await
        .unwrap()
        .is_none());
    assert!(session_repo::find_by_id(&pool, &revoked_unexpired.id)
        .await
        .unwrap()
        .is_some());
    assert!(session_repo::find_by_id(&pool, &valid.id)
        .await
        .unwrap()
        .is_some());

    delete_test_user(&pool, user_id).await;
}

#[tokio::test]
#[ignore = "requires Postgres on DATABASE_URL"]
async fn cleanup_deletes_expired_even_when_revoked() {
    let pool = test_pool().await;
    let user_id = create_test_user(&pool).await;

    let expired_revoked = build_session(user_id, Utc::now() - Duration::days(1), true);
    session_repo::insert(&pool, &expired_revoked).await.unwrap();

    session_service::cleanup_expired_sessions(&pool)
        .await
        .expect("Cleanup failed");

    assert!(session_repo::find_by_id(&pool, &expired_revoked.id)
        .await
        .unwrap()
        .is_none());

    delete_test_user(&pool, user_id).await;
}

#[tokio::test]
#[ignore = "requires Postgres on DATABASE_URL"]
async fn cleanup_is_idempotent() {
    let pool = test_pool().await;
    let user_id = create_test_user(&pool).await;

    let expired = build_session(user_id, Utc::now() - Duration::hours(1), false);
    session_repo::insert(&pool, &expired).await.unwrap();

    session_service::cleanup_expired_sessions(&pool).await.unwrap();
    // Second pass finds nothing new to delete and must not error.
    session_service::cleanup_expired_sessions(&pool).await.unwrap();

    assert!(session_repo::find_by_id(&pool, &expired.id)
        .await
        .unwrap()
        .is_none());

    delete_test_user(&pool, user_id).await;
}

#[tokio::test]
#[ignore = "requires Postgres on DATABASE_URL"]
async fn rotation_reports_the_stored_expiry() {
    let pool = test_pool().await;
    let user_id = create_test_user(&pool).await;

    let session = build_session(user_id, Utc::now() + Duration::days(7), false);
    session_repo::insert(&pool, &session).await.unwrap();

    let new_token = token::generate_refresh_token();
    let reported = session_service::refresh_activity(&pool, &session.id, Some(&new_token), 7)
        .await
        .expect("Rotation failed")
        .expect("Rotation must yield an expiry");

    let stored = session_repo::find_by_id(&pool, &session.id)
        .await
        .unwrap()
        .expect("Session disappeared");

    // The expiry in the response is the row's expiry, not a recomputation.
    assert_eq!(reported, stored.expires_at);
    assert_eq!(stored.refresh_token_hash, token::hash_refresh_token(&new_token));

    delete_test_user(&pool, user_id).await;
}
