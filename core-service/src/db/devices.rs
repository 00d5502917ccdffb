use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Device;

pub async fn count_for_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM devices WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Oldest device by creation time, for device-cap eviction (§4.4 step 3).
pub async fn oldest_for_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Device>, sqlx::Error> {
    sqlx::query_as::<_, Device>(
        r#"
        SELECT id, user_id, device_id, platform, refresh_hash, created_at, last_seen_at
        FROM devices
        WHERE user_id = $1
        ORDER BY created_at ASC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn find(
    pool: &PgPool,
    user_id: Uuid,
    device_id: &str,
) -> Result<Option<Device>, sqlx::Error> {
    sqlx::query_as::<_, Device>(
        r#"
        SELECT id, user_id, device_id, platform, refresh_hash, created_at, last_seen_at
        FROM devices
        WHERE user_id = $1 AND device_id = $2
        "#,
    )
    .bind(user_id)
    .bind(device_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_device_id(
    pool: &PgPool,
    device_id: &str,
) -> Result<Option<Device>, sqlx::Error> {
    sqlx::query_as::<_, Device>(
        r#"
        SELECT id, user_id, device_id, platform, refresh_hash, created_at, last_seen_at
        FROM devices
        WHERE device_id = $1
        "#,
    )
    .bind(device_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Device>, sqlx::Error> {
    sqlx::query_as::<_, Device>(
        r#"
        SELECT id, user_id, device_id, platform, refresh_hash, created_at, last_seen_at
        FROM devices
        WHERE user_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Inserts a fresh device row, or on re-login with the same `device_id`
/// (client reused its stored identifier), overwrites the refresh hash and
/// bumps `last_seen_at` in place.
pub async fn upsert(
    pool: &PgPool,
    user_id: Uuid,
    device_id: &str,
    platform: Option<&str>,
    refresh_hash: &str,
) -> Result<Device, sqlx::Error> {
    sqlx::query_as::<_, Device>(
        r#"
        INSERT INTO devices (user_id, device_id, platform, refresh_hash)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, device_id) DO UPDATE
            SET platform = EXCLUDED.platform,
                refresh_hash = EXCLUDED.refresh_hash,
                last_seen_at = now()
        RETURNING id, user_id, device_id, platform, refresh_hash, created_at, last_seen_at
        "#,
    )
    .bind(user_id)
    .bind(device_id)
    .bind(platform)
    .bind(refresh_hash)
    .fetch_one(pool)
    .await
}

pub async fn update_refresh_hash(
    pool: &PgPool,
    user_id: Uuid,
    device_id: &str,
    refresh_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE devices SET refresh_hash = $3, last_seen_at = now() WHERE user_id = $1 AND device_id = $2",
    )
    .bind(user_id)
    .bind(device_id)
    .bind(refresh_hash)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, user_id: Uuid, device_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM devices WHERE user_id = $1 AND device_id = $2")
        .bind(user_id)
        .bind(device_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_by_device_id(pool: &PgPool, device_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM devices WHERE device_id = $1")
        .bind(device_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Used by user-disable cascade (§4.4): kick every device belonging to the user.
pub async fn delete_all_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Device>, sqlx::Error> {
    sqlx::query_as::<_, Device>(
        r#"
        DELETE FROM devices
        WHERE user_id = $1
        RETURNING id, user_id, device_id, platform, refresh_hash, created_at, last_seen_at
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
