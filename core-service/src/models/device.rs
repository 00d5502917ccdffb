use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A client installation bound to one `(user_id, device_id)`.
///
/// `refresh_hash` mirrors the KV-stored hash at `rt:{device_id}` so an
/// admin listing of devices never needs a Redis round trip, but the KV
/// entry (not this column) is the source of truth for whether the
/// refresh token is still live — the row can outlive an expired hash.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Device {
    pub id: Uuid,
    pub user_id: Uuid,
    pub device_id: String,
    pub platform: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}
