//! Encrypted configuration store (C1).
//!
//! Every other subsystem reads its secrets (JWT keys, SMS vendor
//! credentials, TTL overrides) through this type rather than a
//! process-global config singleton. Values are encrypted at rest with
//! AES-256-GCM (`crypto_core::envelope`) and cached in memory for 30s so
//! the hot path (one read per token sign/verify) doesn't hit Postgres.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

const CACHE_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("config key not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("decryption failed for key {0}")]
    Decrypt(String),
}

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// Thread-safe, cached, AES-256-GCM-protected key/value store.
pub struct SecretStore {
    pool: PgPool,
    key: [u8; 32],
    cache: RwLock<HashMap<String, CacheEntry>>,
}

impl SecretStore {
    pub fn new(pool: PgPool, key: [u8; 32]) -> Self {
        Self {
            pool,
            key,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Reads every row under one transaction and populates the cache.
    /// A decrypt failure here is fatal: it means `CONFIG_ENCRYPTION_KEY`
    /// doesn't match what rows were encrypted with, so every subsystem
    /// downstream would silently malfunction.
    pub async fn preload(&self) -> Result<(), SecretError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT key, value FROM config_entries",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut cache = self.cache.write().await;
        let now = Instant::now();
        for (key, encrypted) in rows {
            let plain = crypto_core::decrypt(&self.key, &encrypted).map_err(|e| {
                error!(key = %key, error = %e, "fatal: config decrypt failed during preload");
                SecretError::Decrypt(key.clone())
            })?;
            cache.insert(
                key,
                CacheEntry {
                    value: plain,
                    expires_at: now + CACHE_TTL,
                },
            );
        }
        info!(count = cache.len(), "secret store preloaded");
        Ok(())
    }

    /// Fresh cache hit returns without a lock upgrade; a miss or stale
    /// entry acquires the writer lock and refetches from Postgres.
    pub async fn get(&self, key: &str) -> Result<String, SecretError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(key) {
                if entry.expires_at > Instant::now() {
                    return Ok(entry.value.clone());
                }
            }
        }

        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM config_entries WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        let encrypted = row.ok_or_else(|| SecretError::NotFound(key.to_string()))?.0;
        let plain = crypto_core::decrypt(&self.key, &encrypted)
            .map_err(|_| SecretError::Decrypt(key.to_string()))?;

        let mut cache = self.cache.write().await;
        cache.insert(
            key.to_string(),
            CacheEntry {
                value: plain.clone(),
                expires_at: Instant::now() + CACHE_TTL,
            },
        );
        Ok(plain)
    }

    /// Like `get`, but falls back to `default` on `NotFound` instead of
    /// surfacing an error — used for non-secret tunables (TTLs, caps)
    /// that are allowed to be unset (spec §7, "locally recovered").
    pub async fn get_or(&self, key: &str, default: &str) -> String {
        match self.get(key).await {
            Ok(v) => v,
            Err(SecretError::NotFound(_)) => default.to_string(),
            Err(e) => {
                warn!(key = %key, error = %e, "config read failed, using default");
                default.to_string()
            }
        }
    }

    pub async fn get_or_parse<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        match self.get(key).await {
            Ok(v) => v.parse().unwrap_or(default),
            Err(_) => default,
        }
    }

    /// Batch read: uncached keys are fetched in one query; cached-but-stale
    /// keys are refetched alongside them rather than one at a time.
    pub async fn get_many(&self, keys: &[&str]) -> Result<HashMap<String, String>, SecretError> {
        let mut out = HashMap::new();
        let mut missing = Vec::new();

        {
            let cache = self.cache.read().await;
            let now = Instant::now();
            for &key in keys {
                match cache.get(key) {
                    Some(entry) if entry.expires_at > now => {
                        out.insert(key.to_string(), entry.value.clone());
                    }
                    _ => missing.push(key.to_string()),
                }
            }
        }

        if missing.is_empty() {
            return Ok(out);
        }

        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT key, value FROM config_entries WHERE key = ANY($1)",
        )
        .bind(&missing)
        .fetch_all(&self.pool)
        .await?;

        let mut cache = self.cache.write().await;
        let now = Instant::now();
        for (key, encrypted) in rows {
            let plain = crypto_core::decrypt(&self.key, &encrypted)
                .map_err(|_| SecretError::Decrypt(key.clone()))?;
            cache.insert(
                key.clone(),
                CacheEntry {
                    value: plain.clone(),
                    expires_at: now + CACHE_TTL,
                },
            );
            out.insert(key, plain);
        }

        Ok(out)
    }

    /// Encrypts and upserts `value`, then invalidates only this key's
    /// cache entry (never the whole cache — `Set` is assumed rare).
    pub async fn set(&self, key: &str, value: &str, updated_by: &str) -> Result<(), SecretError> {
        let encrypted = crypto_core::encrypt(&self.key, value)
            .map_err(|_| SecretError::Decrypt(key.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO config_entries (key, value, updated_at, updated_by)
            VALUES ($1, $2, now(), $3)
            ON CONFLICT (key) DO UPDATE
                SET value = EXCLUDED.value, updated_at = now(), updated_by = EXCLUDED.updated_by
            "#,
        )
        .bind(key)
        .bind(&encrypted)
        .bind(updated_by)
        .execute(&self.pool)
        .await?;

        self.invalidate(key).await;
        Ok(())
    }

    pub async fn invalidate(&self, key: &str) {
        self.cache.write().await.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_entry_freshness() {
        let entry = CacheEntry {
            value: "v".to_string(),
            expires_at: Instant::now() + Duration::from_secs(1),
        };
        assert!(entry.expires_at > Instant::now());
    }
}
