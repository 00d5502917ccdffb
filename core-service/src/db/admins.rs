use sqlx::PgPool;
use uuid::Uuid;

use crate::models::AdminUser;

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admin_users")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn find_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<AdminUser>, sqlx::Error> {
    sqlx::query_as::<_, AdminUser>(
        r#"
        SELECT id, username, password_hash, role, totp_secret, disabled, created_at, updated_at
        FROM admin_users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<AdminUser>, sqlx::Error> {
    sqlx::query_as::<_, AdminUser>(
        r#"
        SELECT id, username, password_hash, role, totp_secret, disabled, created_at, updated_at
        FROM admin_users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Creates the first super-admin during bootstrap (§4.5). Callers must have
/// already verified `count() == 0` to enforce the one-time guard.
pub async fn create_super_admin(
    pool: &PgPool,
    username: &str,
    password_hash: &str,
) -> Result<AdminUser, sqlx::Error> {
    sqlx::query_as::<_, AdminUser>(
        r#"
        INSERT INTO admin_users (username, password_hash, role)
        VALUES ($1, $2, 'SUPER_ADMIN')
        RETURNING id, username, password_hash, role, totp_secret, disabled, created_at, updated_at
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .fetch_one(pool)
    .await
}
