//! Redis key naming functions shared across the session/token/push core.
//!
//! Explicit constructor functions (rather than string constants scattered at
//! call sites) keep key format changes visible at compile time.

/// Maps a device id to its refresh-token hash. TTL == the refresh-token TTL
/// served by the secret store. Written with `SET NX EX` on login, read and
/// deleted atomically with `GETDEL` on refresh.
pub fn key_rt(device_id: &str) -> String {
    format!("rt:{device_id}")
}

/// Stores the 6-digit verification code for a phone number. TTL == 5 minutes.
pub fn key_sms_code(phone: &str) -> String {
    format!("sms:{phone}")
}

/// Rate-limit sentinel for a phone number. TTL == 60s (one request/minute).
pub fn key_sms_limit(phone: &str) -> String {
    format!("sms:limit:{phone}")
}

/// Ring buffer of recently-sent dev-mode SMS codes, newest-first, capped at
/// 200 entries. Only populated when running against the dev SMS adapter.
pub fn key_sms_devlog() -> String {
    "sms:devlog".to_string()
}

/// Cached third-party API response. `q_hash` is the hex-encoded digest of
/// the canonicalized (sorted) query string.
pub fn key_proxy_cache(path: &str, q_hash: &str) -> String {
    format!("proxy:{path}:{q_hash}")
}

/// Stale companion of [`key_proxy_cache`], consulted only when the upstream
/// call fails and the live entry has already expired.
pub fn key_proxy_cache_stale(path: &str, q_hash: &str) -> String {
    format!("proxy:{path}:{q_hash}:stale")
}

/// Pub/Sub channel a single user's events are published to. Every push-hub
/// instance subscribes with the pattern `ws:user:*`.
pub fn key_ws_channel(user_id: &str) -> String {
    format!("ws:user:{user_id}")
}

/// Pattern used to `PSUBSCRIBE` across every user channel.
pub fn ws_channel_pattern() -> &'static str {
    "ws:user:*"
}

/// Consecutive login failure counter for an admin username. TTL == 15
/// minutes; a count >= the configured threshold locks the account.
pub fn key_admin_fail(username: &str) -> String {
    format!("admin:fail:{username}")
}

/// Set when a scheduled upstream cookie refresh fails; the admin dashboard
/// surfaces this as an alert banner. TTL == 24h.
pub fn key_cookie_alert() -> &'static str {
    "cookie:alert"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_match_expected_namespaces() {
        assert_eq!(key_rt("dev-1"), "rt:dev-1");
        assert_eq!(key_sms_code("+15551234567"), "sms:+15551234567");
        assert_eq!(key_sms_limit("+15551234567"), "sms:limit:+15551234567");
        assert_eq!(key_sms_devlog(), "sms:devlog");
        assert_eq!(key_proxy_cache("/recommend/banner", "abc123"), "proxy:/recommend/banner:abc123");
        assert_eq!(
            key_proxy_cache_stale("/recommend/banner", "abc123"),
            "proxy:/recommend/banner:abc123:stale"
        );
        assert_eq!(key_ws_channel("user-1"), "ws:user:user-1");
        assert_eq!(ws_channel_pattern(), "ws:user:*");
        assert_eq!(key_admin_fail("root"), "admin:fail:root");
        assert_eq!(key_cookie_alert(), "cookie:alert");
    }
}
