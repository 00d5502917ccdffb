use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AdminRole {
    Admin,
    SuperAdmin,
}

impl AdminRole {
    /// Numerical rank used by `RequireRole`: `USER=0 < ADMIN=1 < SUPER_ADMIN=2`.
    pub fn rank(&self) -> u8 {
        match self {
            AdminRole::Admin => 1,
            AdminRole::SuperAdmin => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::Admin => "ADMIN",
            AdminRole::SuperAdmin => "SUPER_ADMIN",
        }
    }
}

impl std::str::FromStr for AdminRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(AdminRole::Admin),
            "SUPER_ADMIN" => Ok(AdminRole::SuperAdmin),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdminUser {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub totp_secret: Option<String>,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminUser {
    pub fn role(&self) -> AdminRole {
        self.role.parse().unwrap_or(AdminRole::Admin)
    }
}
