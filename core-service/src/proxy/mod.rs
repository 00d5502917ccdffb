//! Proxy Cache & Upstream Client (C6): a static per-path TTL table backs a
//! live/stale two-tier Redis cache in front of a single upstream HTTP API.

pub mod route_table;

use std::sync::Arc;

use redis::AsyncCommands;
use redis_utils::{keys, SharedConnectionManager};
use reqwest::Client;
use resilience::CircuitBreaker;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::{CoreError, CoreResult};
use crate::secret_store::SecretStore;

use route_table::route_for;

const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

pub struct CachedResponse {
    pub body: String,
    pub etag: String,
    pub cache_status: &'static str,
}

pub struct ProxyClient {
    redis: SharedConnectionManager,
    http: Client,
    secrets: Arc<SecretStore>,
    breaker: CircuitBreaker,
}

/// `?a=1&b=2` and `?b=2&a=1` must hash identically (§4.6).
fn sort_query_parts(raw_query: &str) -> String {
    let mut parts: Vec<&str> = raw_query.split('&').filter(|p| !p.is_empty()).collect();
    parts.sort_unstable();
    parts.join("&")
}

fn short_hex_sha256(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(&digest[..4])
}

fn cache_key_parts(path: &str, raw_query: &str) -> (String, String) {
    let sorted_query = sort_query_parts(raw_query);
    let hashed_input = format!("{path}?{sorted_query}");
    let q_hash = short_hex_sha256(&hashed_input);
    (keys::key_proxy_cache(path, &q_hash), keys::key_proxy_cache_stale(path, &q_hash))
}

fn body_etag(body: &str) -> String {
    format!("\"{}\"", short_hex_sha256(body))
}

impl ProxyClient {
    pub fn new(redis: SharedConnectionManager, secrets: Arc<SecretStore>) -> Self {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("static reqwest client config is valid");

        let circuit_config = resilience::presets::http_external_config().circuit_breaker;
        Self {
            redis,
            http,
            secrets,
            breaker: CircuitBreaker::new(circuit_config),
        }
    }

    /// Dispatch (§4.6). `if_none_match` is the client's `If-None-Match`
    /// header value, if present. Returns `None` when the response should be
    /// a bare 304 (caller attaches the matching `ETag` and an empty body).
    pub async fn fetch(
        &self,
        path: &str,
        raw_query: &str,
        if_none_match: Option<&str>,
    ) -> CoreResult<Option<CachedResponse>> {
        let route = route_for(path);
        let ttl = route.ttl_secs;

        if ttl == 0 {
            let body = self.call_upstream(path, raw_query).await?;
            let etag = body_etag(&body);
            return Ok(Some(CachedResponse { body, etag, cache_status: "MISS" }));
        }

        let (live_key, stale_key) = cache_key_parts(path, raw_query);

        if let Some((body, etag)) = self.read_entry(&live_key).await? {
            if if_none_match == Some(etag.as_str()) {
                return Ok(None);
            }
            return Ok(Some(CachedResponse { body, etag, cache_status: "HIT" }));
        }

        match self.call_upstream(path, raw_query).await {
            Ok(body) => {
                let etag = body_etag(&body);
                self.write_entry(&live_key, &body, &etag, ttl).await?;
                self.write_entry(&stale_key, &body, &etag, ttl * 2).await?;
                Ok(Some(CachedResponse { body, etag, cache_status: "MISS" }))
            }
            Err(err) => {
                warn!(%path, error = %err, "upstream call failed, falling back to stale cache");
                match self.read_entry(&stale_key).await? {
                    Some((body, etag)) => Ok(Some(CachedResponse { body, etag, cache_status: "STALE" })),
                    None => Err(CoreError::UpstreamError),
                }
            }
        }
    }

    async fn read_entry(&self, key: &str) -> CoreResult<Option<(String, String)>> {
        let raw: Option<String> = {
            let mut conn = self.redis.lock().await;
            conn.get(key).await?
        };
        let Some(raw) = raw else { return Ok(None) };
        match serde_json::from_str::<StoredEntry>(&raw) {
            Ok(entry) => Ok(Some((entry.body, entry.etag))),
            Err(_) => Ok(None),
        }
    }

    async fn write_entry(&self, key: &str, body: &str, etag: &str, ttl_secs: u64) -> CoreResult<()> {
        let entry = StoredEntry { body: body.to_string(), etag: etag.to_string() };
        let serialized = serde_json::to_string(&entry).map_err(|_| CoreError::Internal)?;
        let mut conn = self.redis.lock().await;
        let _: () = conn.set_ex(key, serialized, ttl_secs).await?;
        Ok(())
    }

    /// One attempt against the primary base URL, one retry against
    /// `API_FALLBACK_URL` if configured (§4.6 step 5). The circuit breaker
    /// wraps the whole two-attempt sequence as a single external call.
    async fn call_upstream(&self, path: &str, raw_query: &str) -> CoreResult<String> {
        let api_base = self.secrets.get_or("API_BASE_URL", "").await;
        let fallback_base = self.secrets.get_or("API_FALLBACK_URL", "").await;
        let creds = self.load_upstream_creds().await;

        let primary_result = self
            .breaker
            .call(|| self.request_once(&api_base, &creds, path, raw_query))
            .await;

        match primary_result {
            Ok(body) => Ok(body),
            Err(primary_err) if !fallback_base.is_empty() => {
                warn!(%path, error = %primary_err, "primary upstream failed, retrying against fallback base");
                self.request_once(&fallback_base, &creds, path, raw_query)
                    .await
                    .map_err(|_| CoreError::UpstreamError)
            }
            Err(_) => Err(CoreError::UpstreamError),
        }
    }

    /// The upstream credential shape is whatever the cookie-refresh cron
    /// (a named boundary collaborator, not implemented here) last wrote:
    /// either a bearer API key or a legacy session cookie + API key pair.
    async fn load_upstream_creds(&self) -> UpstreamCreds {
        let api_key = self.secrets.get_or("API_KEY", "").await;
        let cookie = self.secrets.get_or("API_LEGACY_COOKIE", "").await;

        if cookie.is_empty() {
            UpstreamCreds::Bearer(api_key)
        } else {
            UpstreamCreds::LegacyCookie { cookie, api_key }
        }
    }

    async fn request_once(
        &self,
        base: &str,
        creds: &UpstreamCreds,
        path: &str,
        raw_query: &str,
    ) -> Result<String, String> {
        let url = if raw_query.is_empty() {
            format!("{base}{path}")
        } else {
            format!("{base}{path}?{raw_query}")
        };

        let mut request = self.http.get(&url);
        request = match creds {
            UpstreamCreds::Bearer(api_key) => request.header("Authorization", format!("Bearer {api_key}")),
            UpstreamCreds::LegacyCookie { cookie, api_key } => {
                request.header("Cookie", cookie).header("X-Api-Key", api_key)
            }
        };

        let response = request.send().await.map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("upstream status {}", response.status()));
        }

        let bytes = response.bytes().await.map_err(|e| e.to_string())?;
        if bytes.len() > MAX_BODY_BYTES {
            return Err("upstream body exceeds 4 MiB cap".to_string());
        }

        String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string())
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct StoredEntry {
    body: String,
    etag: String,
}

enum UpstreamCreds {
    Bearer(String),
    LegacyCookie { cookie: String, api_key: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_query_parts_is_order_independent() {
        assert_eq!(sort_query_parts("a=1&b=2"), sort_query_parts("b=2&a=1"));
    }

    #[test]
    fn cache_key_is_stable_across_query_order() {
        let a = cache_key_parts("/recommend/banner", "a=1&b=2");
        let b = cache_key_parts("/recommend/banner", "b=2&a=1");
        assert_eq!(a, b);
    }

    #[test]
    fn etag_is_quoted_and_stable() {
        let a = body_etag("hello");
        let b = body_etag("hello");
        assert_eq!(a, b);
        assert!(a.starts_with('"') && a.ends_with('"'));
    }
}
