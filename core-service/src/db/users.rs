use sqlx::PgPool;
use uuid::Uuid;

use crate::models::User;

/// Creates the user row on first SMS verification, or returns the existing
/// one unchanged. `phone` is the unique identity; role defaults to `USER`.
pub async fn upsert_by_phone(pool: &PgPool, phone: &str) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (phone)
        VALUES ($1)
        ON CONFLICT (phone) DO UPDATE SET phone = EXCLUDED.phone
        RETURNING id, phone, role, disabled, created_at, updated_at
        "#,
    )
    .bind(phone)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, phone, role, disabled, created_at, updated_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn set_disabled(pool: &PgPool, id: Uuid, disabled: bool) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET disabled = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(disabled)
        .execute(pool)
        .await?;
    Ok(())
}

/// Used by key rotation to broadcast `config.jwt_rotated` to every user.
pub async fn all_ids(pool: &PgPool) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM users").fetch_all(pool).await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}
