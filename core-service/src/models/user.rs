use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// App-level role granted to an end user. Distinct from [`AdminRole`].
///
/// Stored as plain `TEXT` in the `users.role` column (not a SQL enum type),
/// so conversion is via [`std::str::FromStr`] / [`UserRole::as_str`] rather
/// than `sqlx::Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    User,
    Admin,
    Vip,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "USER",
            UserRole::Admin => "ADMIN",
            UserRole::Vip => "VIP",
        }
    }

    /// Same `USER=0 < ADMIN=1` scale `RequireRole` compares against
    /// [`AdminRole::rank`]; `Vip` is an entitlement tier, not a permission
    /// level, so it ranks alongside `User`.
    pub fn rank(&self) -> u8 {
        match self {
            UserRole::User | UserRole::Vip => 0,
            UserRole::Admin => 1,
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(UserRole::User),
            "ADMIN" => Ok(UserRole::Admin),
            "VIP" => Ok(UserRole::Vip),
            _ => Err(()),
        }
    }
}

/// A registered end user, created on first successful SMS verification.
/// Never hard-deleted; disabling cascades a device kick to every session.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub phone: String,
    pub role: String,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> UserRole {
        self.role.parse().unwrap_or(UserRole::User)
    }
}
