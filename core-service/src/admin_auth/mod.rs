//! Admin Auth (C5): password+TOTP login with brute-force lockout, signing
//! key rotation, and first-run bootstrap.

pub mod password;
pub mod totp;

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use rand::RngCore;
use redis::Client;
use redis_utils::{keys, kv, SharedConnectionManager};
use serde_json::json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db::{admins, operation_log, users};
use crate::error::{CoreError, CoreResult};
use crate::models::{AdminRole, AdminUser};
use crate::secret_store::SecretStore;
use crate::token::TokenService;
use crate::ws::{publish_to_user, EventType, PushEvent};

const FAIL_LIMIT: i64 = 5;
const FAIL_WINDOW_SECS: u64 = 15 * 60;

const USER_JWT_SECRET_KEY: &str = "USER_JWT_SECRET";
const ADMIN_JWT_SECRET_KEY: &str = "ADMIN_JWT_SECRET";

pub struct AdminLoginResult {
    pub access_token: String,
    pub expires_in: i64,
    pub role: AdminRole,
}

pub struct AdminAuthService {
    pool: PgPool,
    redis: SharedConnectionManager,
    pubsub_client: Client,
    tokens: Arc<TokenService>,
    secrets: Arc<SecretStore>,
}

impl AdminAuthService {
    pub fn new(
        pool: PgPool,
        redis: SharedConnectionManager,
        pubsub_client: Client,
        tokens: Arc<TokenService>,
        secrets: Arc<SecretStore>,
    ) -> Self {
        Self {
            pool,
            redis,
            pubsub_client,
            tokens,
            secrets,
        }
    }

    async fn fail_count(&self, username: &str) -> CoreResult<i64> {
        let mut guard = self.redis.lock().await;
        let count: Option<i64> = redis::AsyncCommands::get(&mut *guard, keys::key_admin_fail(username)).await?;
        Ok(count.unwrap_or(0))
    }

    /// Increments the lockout counter, setting its TTL only on first
    /// increment so repeated failures don't keep extending the window.
    async fn record_failure(&self, username: &str) -> CoreResult<()> {
        let key = keys::key_admin_fail(username);
        let mut guard = self.redis.lock().await;
        let count: i64 = redis::AsyncCommands::incr(&mut *guard, &key, 1).await?;
        if count == 1 {
            let _: () = redis::AsyncCommands::expire(&mut *guard, &key, FAIL_WINDOW_SECS as i64).await?;
        }
        Ok(())
    }

    async fn clear_failures(&self, username: &str) -> CoreResult<()> {
        let mut guard = self.redis.lock().await;
        let _: () = redis::AsyncCommands::del(&mut *guard, keys::key_admin_fail(username)).await?;
        Ok(())
    }

    async fn lock_ttl_secs(&self, username: &str) -> CoreResult<i64> {
        let mut guard = self.redis.lock().await;
        let ttl: i64 = redis::AsyncCommands::ttl(&mut *guard, keys::key_admin_fail(username)).await?;
        Ok(ttl.max(0))
    }

    /// §4.5 login sequence. `client_ip` is recorded on the audit row only.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        totp_code: Option<&str>,
        client_ip: Option<&str>,
    ) -> CoreResult<AdminLoginResult> {
        if self.fail_count(username).await? >= FAIL_LIMIT {
            let ttl = self.lock_ttl_secs(username).await?;
            return Err(CoreError::AccountLocked {
                unlock_at: Utc::now() + ChronoDuration::seconds(ttl),
            });
        }

        let Some(admin) = admins::find_by_username(&self.pool, username).await? else {
            self.record_failure(username).await?;
            return Err(CoreError::InvalidCredentials);
        };

        if admin.disabled {
            return Err(CoreError::AccountDisabled);
        }

        if !password::verify_password(password, &admin.password_hash) {
            self.record_failure(username).await?;
            return Err(CoreError::InvalidCredentials);
        }

        if let Some(secret) = &admin.totp_secret {
            let Some(code) = totp_code else {
                return Err(CoreError::TotpRequired);
            };
            if !totp::verify_code(secret, code) {
                return Err(CoreError::InvalidTotp);
            }
        }

        self.clear_failures(username).await?;

        let role = admin.role();
        let (access_token, expires_in) = self.tokens.sign_admin(admin.id, &admin.username, role.as_str()).await?;

        let pool = self.pool.clone();
        let admin_id = admin.id;
        let client_ip = client_ip.map(|s| s.to_string());
        tokio::spawn(async move {
            operation_log::append(
                &pool,
                admin_id,
                crate::models::operation_log::action::ADMIN_LOGIN,
                None,
                None,
                None,
                client_ip.as_deref(),
            )
            .await;
        });

        Ok(AdminLoginResult {
            access_token,
            expires_in,
            role,
        })
    }

    /// Key rotation orchestrator (§4.5). `secret_key` must be one of
    /// [`USER_JWT_SECRET_KEY`] or [`ADMIN_JWT_SECRET_KEY`]; the caller's
    /// handler enforces the SUPER_ADMIN rank requirement before calling in.
    pub async fn rotate_key(&self, actor: &AdminUser, secret_key: &str) -> CoreResult<u64> {
        if secret_key != USER_JWT_SECRET_KEY && secret_key != ADMIN_JWT_SECRET_KEY {
            return Err(CoreError::InvalidRequest);
        }

        let new_secret = generate_hex_secret();
        self.secrets.set(secret_key, &new_secret, &actor.username).await?;

        let mut affected_sessions = 0u64;

        if secret_key == USER_JWT_SECRET_KEY {
            affected_sessions = kv::scan_del(&self.redis, "rt:*").await?;

            let user_ids = users::all_ids(&self.pool).await?;
            for user_id in user_ids {
                let event = PushEvent::new(
                    EventType::ConfigJwtRotated,
                    json!({ "affected_sessions": affected_sessions }),
                );
                let _ = publish_to_user(&self.pubsub_client, user_id, event).await;
            }
        }

        operation_log::append(
            &self.pool,
            actor.id,
            crate::models::operation_log::action::JWT_SECRET_ROTATED,
            Some(secret_key),
            Some("[secret]"),
            Some("[secret]"),
            None,
        )
        .await;

        info!(actor = %actor.username, key = secret_key, affected_sessions, "jwt secret rotated");
        Ok(affected_sessions)
    }

    /// First-run bootstrap (§4.5). Returns `AlreadyInitialized` once an
    /// admin already exists — this endpoint is unauthenticated and must
    /// stay a one-shot.
    pub async fn bootstrap(
        &self,
        username: &str,
        password: &str,
        site_settings: &[(&str, &str)],
    ) -> CoreResult<Uuid> {
        if admins::count(&self.pool).await? > 0 {
            return Err(CoreError::AlreadyInitialized);
        }

        if !password::meets_strength_requirements(password) {
            return Err(CoreError::WeakPassword);
        }

        let user_secret = generate_hex_secret();
        let admin_secret = generate_hex_secret();
        self.secrets.set(USER_JWT_SECRET_KEY, &user_secret, username).await?;
        self.secrets.set(ADMIN_JWT_SECRET_KEY, &admin_secret, username).await?;

        for (key, value) in site_settings {
            self.secrets.set(key, value, username).await?;
        }

        let password_hash =
            password::hash_password(password).map_err(|_| CoreError::Internal)?;
        let admin = admins::create_super_admin(&self.pool, username, &password_hash).await?;

        self.secrets.preload().await?;

        operation_log::append(
            &self.pool,
            admin.id,
            crate::models::operation_log::action::ADMIN_BOOTSTRAPPED,
            None,
            None,
            None,
            None,
        )
        .await;

        info!(%username, "super-admin bootstrapped");
        Ok(admin.id)
    }
}

fn generate_hex_secret() -> String {
    let mut bytes = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
