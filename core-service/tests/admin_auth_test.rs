//! Integration tests for admin bootstrap and lockout (S5, S6), against a
//! real Postgres + Redis. Assumes a disposable test database: bootstrap is
//! a global one-time guard, so these tests clear `admin_users` first.
//!
//! Run with: `DATABASE_URL=... REDIS_URL=... CONFIG_ENCRYPTION_KEY=... \
//! cargo test --test admin_auth_test -- --ignored --test-threads=1`

use std::sync::Arc;

use core_service::admin_auth::AdminAuthService;
use core_service::error::CoreError;
use core_service::secret_store::SecretStore;
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

async fn bootstrap_admin_auth() -> (AdminAuthService, PgPool) {
    let pool = bootstrap_pool().await;
    sqlx::query("DELETE FROM admin_users").execute(&pool).await.ok();

    let redis_url = std::env::var("REDIS_URL").expect("REDIS_URL env var required for these tests");
    let redis_pool = RedisPool::connect(&redis_url, None)
        .await
        .expect("failed to connect to REDIS_URL");
    let redis = redis_pool.manager();
    let pubsub_client = redis::Client::open(redis_url.as_str()).expect("failed to open pubsub client");

    let key_hex = std::env::var("CONFIG_ENCRYPTION_KEY").unwrap_or_else(|_| "0".repeat(64));
    let key = crypto_core::parse_key(&key_hex).expect("CONFIG_ENCRYPTION_KEY must be 32 bytes hex");

    let secrets = Arc::new(SecretStore::new(pool.clone(), key));
    let tokens = Arc::new(TokenService::new(secrets.clone()));
    let admin_auth = AdminAuthService::new(pool.clone(), redis, pubsub_client, tokens, secrets);
    (admin_auth, pool)
}

#[tokio::test]
#[ignore]
#[serial]
async fn bootstrap_is_one_shot() {
    let (admin_auth, _pool) = bootstrap_admin_auth().await;

    let first = admin_auth
        .bootstrap("root", "Str0ng!Password", &[])
        .await
        .expect("first bootstrap should succeed");
    assert!(!first.is_nil());

    let second = admin_auth.bootstrap("someone-else", "An0ther!Password", &[]).await;
    assert!(
        matches!(second, Err(CoreError::AlreadyInitialized)),
        "a second bootstrap call must be rejected once an admin exists"
    );
}

#[tokio::test]
#[ignore]
#[serial]
async fn bootstrap_rejects_weak_password() {
    let (admin_auth, _pool) = bootstrap_admin_auth().await;

    let result = admin_auth.bootstrap("root", "short", &[]).await;
    assert!(matches!(result, Err(CoreError::WeakPassword)));
}

#[tokio::test]
#[ignore]
#[serial]
async fn repeated_failed_logins_lock_the_account() {
    let (admin_auth, _pool) = bootstrap_admin_auth().await;
    admin_auth
        .bootstrap("lockout-admin", "Str0ng!Password", &[])
        .await
        .expect("bootstrap should succeed");

    for _ in 0..5 {
        let attempt = admin_auth
            .login("lockout-admin", "wrong-password", None, None)
            .await;
        assert!(matches!(attempt, Err(CoreError::InvalidCredentials)));
    }

    // The 6th attempt, even with the correct password, must be rejected
    // because the account is now locked (§4.5 brute-force lockout).
    let locked_attempt = admin_auth
        .login("lockout-admin", "Str0ng!Password", None, None)
        .await;
    assert!(
        matches!(locked_attempt, Err(CoreError::AccountLocked { .. })),
        "account must be locked after 5 consecutive failures"
    );
}
