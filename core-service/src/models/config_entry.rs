use chrono::{DateTime, Utc};

/// A single encrypted row backing the Secret Store (C1). `value` is the
/// base64-JSON AES-256-GCM envelope produced by `crypto_core::envelope`;
/// it is decrypted on read by the secret store, never by callers directly.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}
