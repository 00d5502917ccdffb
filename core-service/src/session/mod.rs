//! Session Manager (C4) — device registry, device-cap eviction, and the
//! replay-safe refresh rotation that is the heart of this subsystem.

use std::sync::Arc;

use redis::Client;
use redis_utils::{keys, kv, SharedConnectionManager};
use serde_json::json;
use sqlx::PgPool;
use subtle::ConstantTimeEq;
use tracing::info;
use uuid::Uuid;

use crate::db::{devices, users};
use crate::error::{CoreError, CoreResult};
use crate::models::User;
use crate::token::TokenService;
use crate::ws::{publish_to_user, EventType, PushEvent};

pub struct LoginResult {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub device_id: String,
}

pub struct SessionManager {
    pool: PgPool,
    redis: SharedConnectionManager,
    pubsub_client: Client,
    tokens: Arc<TokenService>,
    secrets: Arc<crate::secret_store::SecretStore>,
}

impl SessionManager {
    pub fn new(
        pool: PgPool,
        redis: SharedConnectionManager,
        pubsub_client: Client,
        tokens: Arc<TokenService>,
        secrets: Arc<crate::secret_store::SecretStore>,
    ) -> Self {
        Self {
            pool,
            redis,
            pubsub_client,
            tokens,
            secrets,
        }
    }

    async fn max_devices(&self) -> i64 {
        self.secrets.get_or_parse("MAX_DEVICES", 5).await
    }

    /// Post-SMS-verify login (§4.4). `client_device_id` is the id the client
    /// supplied, if any; one is generated otherwise.
    pub async fn login(
        &self,
        phone: &str,
        client_device_id: Option<String>,
        platform: Option<&str>,
    ) -> CoreResult<LoginResult> {
        let user = users::upsert_by_phone(&self.pool, phone).await?;
        let device_id = client_device_id.unwrap_or_else(|| Uuid::new_v4().to_string());

        self.evict_if_over_cap(&user).await?;

        let (access_token, expires_in) = self
            .tokens
            .sign_user(user.id, &device_id, user.role().as_str())
            .await?;

        let refresh = self.tokens.mint_refresh();
        let refresh_ttl = self.tokens.refresh_ttl().await as u64;

        kv::set_nx(&self.redis, &keys::key_rt(&device_id), &refresh.hash, refresh_ttl).await?;
        devices::upsert(&self.pool, user.id, &device_id, platform, &refresh.hash).await?;

        Ok(LoginResult {
            access_token,
            refresh_token: refresh.plaintext,
            expires_in,
            device_id,
        })
    }

    /// Evicts the oldest device (§4.4 step 3) when the user is already at
    /// or over `MAX_DEVICES` before the new login is admitted.
    async fn evict_if_over_cap(&self, user: &User) -> CoreResult<()> {
        let cap = self.max_devices().await;
        let count = devices::count_for_user(&self.pool, user.id).await?;

        if count < cap {
            return Ok(());
        }

        let Some(oldest) = devices::oldest_for_user(&self.pool, user.id).await? else {
            return Ok(());
        };

        kv::get_del(&self.redis, &keys::key_rt(&oldest.device_id)).await?;
        devices::delete(&self.pool, user.id, &oldest.device_id).await?;

        let event = PushEvent::new(
            EventType::DeviceKicked,
            json!({ "device_id": oldest.device_id, "reason": "max_devices" }),
        );
        let _ = publish_to_user(&self.pubsub_client, user.id, event).await;

        info!(user_id = %user.id, device_id = %oldest.device_id, "device evicted over cap");
        Ok(())
    }

    /// Atomic read-and-delete refresh rotation (§4.4 Refresh, §8 property 1).
    pub async fn refresh(&self, refresh_token: &str, device_id: &str) -> CoreResult<LoginResult> {
        let presented_hash = self.tokens.hash_refresh(refresh_token);

        let stored_hash = kv::get_del(&self.redis, &keys::key_rt(device_id))
            .await?
            .ok_or(CoreError::TokenReused)?;

        if stored_hash.as_bytes().ct_eq(presented_hash.as_bytes()).unwrap_u8() != 1 {
            return Err(CoreError::TokenReused);
        }

        let device = devices::find_by_device_id(&self.pool, device_id)
            .await?
            .ok_or(CoreError::DeviceRevoked)?;

        let user = users::find_by_id(&self.pool, device.user_id)
            .await?
            .ok_or(CoreError::DeviceRevoked)?;

        if user.disabled {
            return Err(CoreError::UserDisabled);
        }

        let (access_token, expires_in) = self
            .tokens
            .sign_user(user.id, device_id, user.role().as_str())
            .await?;

        let new_refresh = self.tokens.mint_refresh();
        let refresh_ttl = self.tokens.refresh_ttl().await as u64;

        kv::set_nx(&self.redis, &keys::key_rt(device_id), &new_refresh.hash, refresh_ttl).await?;
        devices::update_refresh_hash(&self.pool, user.id, device_id, &new_refresh.hash).await?;

        Ok(LoginResult {
            access_token,
            refresh_token: new_refresh.plaintext,
            expires_in,
            device_id: device_id.to_string(),
        })
    }

    /// Self-initiated logout: no push is published (§4.4 Logout).
    pub async fn logout(&self, user_id: Uuid, device_id: &str) -> CoreResult<()> {
        kv::get_del(&self.redis, &keys::key_rt(device_id)).await?;
        devices::delete(&self.pool, user_id, device_id).await?;
        Ok(())
    }

    pub async fn list_devices(&self, user_id: Uuid) -> CoreResult<Vec<crate::models::Device>> {
        Ok(devices::list_for_user(&self.pool, user_id).await?)
    }

    /// Admin single-device kick (§6 `POST /admin/devices/{deviceId}/kick`).
    pub async fn admin_kick_device(&self, user_id: Uuid, device_id: &str) -> CoreResult<()> {
        kv::get_del(&self.redis, &keys::key_rt(device_id)).await?;
        let affected = devices::delete(&self.pool, user_id, device_id).await?;

        if affected == 0 {
            return Err(CoreError::DeviceNotFound);
        }

        let event = PushEvent::new(
            EventType::DeviceKicked,
            json!({ "device_id": device_id, "reason": "admin" }),
        );
        let _ = publish_to_user(&self.pubsub_client, user_id, event).await;
        Ok(())
    }

    /// Disables a user and cascades a kick to every one of their devices
    /// (§4.4 "Admin device-kick / user-disable").
    pub async fn disable_user_cascade(&self, user_id: Uuid) -> CoreResult<()> {
        users::set_disabled(&self.pool, user_id, true).await?;
        let kicked = devices::delete_all_for_user(&self.pool, user_id).await?;

        for device in kicked {
            kv::get_del(&self.redis, &keys::key_rt(&device.device_id)).await.ok();
            let event = PushEvent::new(
                EventType::DeviceKicked,
                json!({ "device_id": device.device_id, "reason": "admin" }),
            );
            let _ = publish_to_user(&self.pubsub_client, user_id, event).await;
        }

        Ok(())
    }
}
