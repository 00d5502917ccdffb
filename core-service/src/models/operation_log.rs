use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Append-only audit trail of admin actions. `before`/`after` may be the
/// literal string `"[secret]"` when the action touches signing keys —
/// see `admin_auth::rotate_key`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OperationLog {
    pub id: i64,
    pub admin_id: Uuid,
    pub action: String,
    pub target_id: Option<String>,
    pub before_value: Option<String>,
    pub after_value: Option<String>,
    pub client_ip: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Enumerated action codes recorded to `operation_log.action`.
pub mod action {
    pub const ADMIN_LOGIN: &str = "ADMIN_LOGIN";
    pub const JWT_SECRET_ROTATED: &str = "JWT_SECRET_ROTATED";
    pub const DEVICE_KICKED: &str = "DEVICE_KICKED";
    pub const USER_DISABLED: &str = "USER_DISABLED";
    pub const ADMIN_BOOTSTRAPPED: &str = "ADMIN_BOOTSTRAPPED";
}
