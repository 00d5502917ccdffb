//! KV primitives needed by the session/token/push core beyond plain
//! get/set: atomic read-delete, set-if-absent, a capped ring buffer, and
//! cursor-based pattern delete.

use crate::SharedConnectionManager;
use anyhow::Result;
use redis::AsyncCommands;

/// Atomically reads and deletes `key`, returning the prior value if it
/// existed. Used for replay-safe refresh-token consumption: a refresh
/// token can be redeemed at most once even under concurrent requests.
pub async fn get_del(conn: &SharedConnectionManager, key: &str) -> Result<Option<String>> {
    let mut guard = conn.lock().await;
    let value: Option<String> = guard.get_del(key).await?;
    Ok(value)
}

/// Sets `key` to `value` only if it does not already exist, with an
/// expiry of `ttl_secs`. Returns `true` if the key was set. Used to mint a
/// device's refresh-token slot without clobbering a concurrent login.
pub async fn set_nx(
    conn: &SharedConnectionManager,
    key: &str,
    value: &str,
    ttl_secs: u64,
) -> Result<bool> {
    let mut guard = conn.lock().await;
    let opts = redis::SetOptions::default()
        .conditional_set(redis::ExistenceCheck::NX)
        .with_expiration(redis::SetExpiry::EX(ttl_secs as i64));
    let result: Option<String> = guard.set_options(key, value, opts).await?;
    Ok(result.is_some())
}

/// Pushes `member` onto the sorted set at `key` scored by `score` (typically
/// a timestamp), then trims the set to the most recent `cap` members.
/// Used for the dev-mode SMS ring so it never grows unbounded.
pub async fn zadd_trim(
    conn: &SharedConnectionManager,
    key: &str,
    member: &str,
    score: f64,
    cap: isize,
) -> Result<()> {
    let mut guard = conn.lock().await;
    let _: i64 = guard.zadd(key, member, score).await?;
    // Keep only the top `cap` by score (highest first); ZREMRANGEBYRANK
    // trims everything below the top `cap` ranks.
    let _: i64 = guard.zremrangebyrank(key, 0, -(cap + 1)).await?;
    Ok(())
}

/// Deletes every key matching `pattern` using cursor-based `SCAN` in
/// batches of 100, pipelining the `DEL` calls for each batch. Used to
/// invalidate every outstanding refresh token (`rt:*`) when a signing
/// secret is rotated.
pub async fn scan_del(conn: &SharedConnectionManager, pattern: &str) -> Result<u64> {
    let mut guard = conn.lock().await;
    let mut cursor: u64 = 0;
    let mut deleted: u64 = 0;

    loop {
        let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(100)
            .query_async(&mut *guard)
            .await?;

        if !batch.is_empty() {
            let mut pipe = redis::pipe();
            for key in &batch {
                pipe.del(key);
            }
            let _: Vec<i64> = pipe.query_async(&mut *guard).await?;
            deleted += batch.len() as u64;
        }

        cursor = next_cursor;
        if cursor == 0 {
            break;
        }
    }

    Ok(deleted)
}
