//! Integration tests for the session/token core against a real
//! Postgres + Redis, mirroring S1-S3 of the documented scenarios:
//! login -> refresh -> replay, device-cap eviction, and key rotation.
//!
//! Run with: `DATABASE_URL=... REDIS_URL=... CONFIG_ENCRYPTION_KEY=... \
//! cargo test --test refresh_replay_test -- --ignored --test-threads=1`
//! A schema matching `migrations/0001_initial.sql` must already exist.

use std::sync::Arc;

use core_service::secret_store::SecretStore;
use core_service::session::SessionManager;
use core_service::token::TokenService;
use redis_utils::RedisPool;
use serial_test::serial;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

async fn bootstrap_pool() -> PgPool {
    let db_url = std::env::var("DATABASE_URL").expect("DATABASE_URL env var required for these tests");
    PgPoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await
        .expect("failed to connect to DATABASE_URL")
}

async fn bootstrap_session_manager() -> (SessionManager, Arc<SecretStore>, PgPool) {
    let pool = bootstrap_pool().await;
    let redis_url = std::env::var("REDIS_URL").expect("REDIS_URL env var required for these tests");
    let redis_pool = RedisPool::connect(&redis_url, None)
        .await
        .expect("failed to connect to REDIS_URL");
    let redis = redis_pool.manager();
    let pubsub_client = redis::Client::open(redis_url.as_str()).expect("failed to open pubsub client");

    let key_hex = std::env::var("CONFIG_ENCRYPTION_KEY").unwrap_or_else(|_| "0".repeat(64));
    let key = crypto_core::parse_key(&key_hex).expect("CONFIG_ENCRYPTION_KEY must be 32 bytes hex");

    let secrets = Arc::new(SecretStore::new(pool.clone(), key));
    secrets
        .set("USER_JWT_SECRET", "test-user-jwt-secret", "test-harness")
        .await
        .expect("failed to seed USER_JWT_SECRET");

    let tokens = Arc::new(TokenService::new(secrets.clone()));
    let sessions = SessionManager::new(pool.clone(), redis, pubsub_client, tokens, secrets.clone());
    (sessions, secrets, pool)
}

async fn device_ids_for_phone(pool: &PgPool, phone: &str) -> Vec<String> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT device_id FROM devices WHERE user_id = (SELECT id FROM users WHERE phone = $1)",
    )
    .bind(phone)
    .fetch_all(pool)
    .await
    .expect("failed to list devices for phone");
    rows.into_iter().map(|(id,)| id).collect()
}

async fn cleanup_user(pool: &PgPool, phone: &str) {
    let _ = sqlx::query("DELETE FROM devices WHERE user_id IN (SELECT id FROM users WHERE phone = $1)")
        .bind(phone)
        .execute(pool)
        .await;
    let _ = sqlx::query("DELETE FROM users WHERE phone = $1")
        .bind(phone)
        .execute(pool)
        .await;
}

#[tokio::test]
#[ignore]
#[serial]
async fn login_then_refresh_then_replay_is_rejected() {
    let (sessions, _secrets, pool) = bootstrap_session_manager().await;
    let phone = "+15550001111";
    cleanup_user(&pool, phone).await;

    let login = sessions
        .login(phone, Some("device-a".to_string()), Some("ios"))
        .await
        .expect("login should succeed");

    let refreshed = sessions
        .refresh(&login.refresh_token, &login.device_id)
        .await
        .expect("first refresh should succeed");
    assert_ne!(refreshed.refresh_token, login.refresh_token);

    // Replaying the already-consumed refresh token must fail: the GETDEL
    // already removed it from Redis on the first call above.
    let replay = sessions.refresh(&login.refresh_token, &login.device_id).await;
    assert!(replay.is_err(), "replaying a spent refresh token must be rejected");

    cleanup_user(&pool, phone).await;
}

/// §8 testable property 1: under concurrent redemption of the same refresh
/// token, exactly one caller wins. The atomic `GETDEL` backing
/// `SessionManager::refresh` is what guarantees this, not application-level
/// locking, so two tasks racing the same call must never both succeed.
#[tokio::test]
#[ignore]
#[serial]
async fn concurrent_refresh_replay_exactly_one_winner() {
    let (sessions, _secrets, pool) = bootstrap_session_manager().await;
    let phone = "+15550002222";
    cleanup_user(&pool, phone).await;

    let login = sessions
        .login(phone, Some("device-b".to_string()), Some("android"))
        .await
        .expect("login should succeed");

    let sessions = Arc::new(sessions);
    let refresh_token = login.refresh_token.clone();
    let device_id = login.device_id.clone();

    let sessions_a = sessions.clone();
    let token_a = refresh_token.clone();
    let device_a = device_id.clone();
    let task_a = tokio::spawn(async move { sessions_a.refresh(&token_a, &device_a).await });

    let sessions_b = sessions.clone();
    let token_b = refresh_token.clone();
    let device_b = device_id.clone();
    let task_b = tokio::spawn(async move { sessions_b.refresh(&token_b, &device_b).await });

    let (result_a, result_b) = tokio::join!(task_a, task_b);
    let successes = [result_a.unwrap(), result_b.unwrap()]
        .into_iter()
        .filter(|r| r.is_ok())
        .count();

    assert_eq!(successes, 1, "exactly one racing refresh call must win");

    cleanup_user(&pool, phone).await;
}

#[tokio::test]
#[ignore]
#[serial]
async fn device_cap_evicts_oldest_device() {
    let (sessions, secrets, pool) = bootstrap_session_manager().await;
    let phone = "+15550003333";
    cleanup_user(&pool, phone).await;

    secrets
        .set("MAX_DEVICES", "2", "test-harness")
        .await
        .expect("failed to seed MAX_DEVICES");

    let first = sessions.login(phone, Some("device-1".to_string()), None).await.unwrap();
    let _second = sessions.login(phone, Some("device-2".to_string()), None).await.unwrap();
    let _third = sessions.login(phone, Some("device-3".to_string()), None).await.unwrap();

    let remaining = device_ids_for_phone(&pool, phone).await;
    assert_eq!(remaining.len(), 2, "oldest device should have been evicted");
    assert!(
        !remaining.contains(&first.device_id),
        "the oldest device (device-1) must be the one evicted"
    );

    cleanup_user(&pool, phone).await;
}
