//! SMS verification code service (C3).

pub mod adapter;

use std::sync::Arc;

use rand::Rng;
use redis::AsyncCommands;
use redis_utils::{keys, kv, SharedConnectionManager};
use resilience::{presets, CircuitBreaker};
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use adapter::{AliyunAdapter, DevAdapter, NoopAdapter, SmsAdapter, TencentAdapter};

use crate::error::{CoreError, CoreResult};
use crate::secret_store::SecretStore;

const CODE_TTL_SECS: u64 = 300;
const LIMIT_TTL_SECS: u64 = 60;

pub struct SmsService {
    redis: SharedConnectionManager,
    adapter: Box<dyn SmsAdapter>,
    breaker: CircuitBreaker,
}

impl SmsService {
    /// Resolves the active vendor adapter from `SMS_PROVIDER`. An unknown
    /// value degrades to the dev stub with a warning (§4.3, §9) rather than
    /// failing startup.
    pub async fn from_config(secrets: &Arc<SecretStore>, redis: SharedConnectionManager) -> Self {
        let provider = secrets.get_or("SMS_PROVIDER", "").await;

        let adapter: Box<dyn SmsAdapter> = match provider.as_str() {
            "aliyun" => {
                let keys_map = secrets
                    .get_many(&["SMS_ALIYUN_KEY_ID", "SMS_ALIYUN_KEY_SECRET", "SMS_SIGN_NAME", "SMS_TEMPLATE_CODE"])
                    .await
                    .unwrap_or_default();
                Box::new(AliyunAdapter::new(
                    keys_map.get("SMS_ALIYUN_KEY_ID").cloned().unwrap_or_default(),
                    keys_map.get("SMS_ALIYUN_KEY_SECRET").cloned().unwrap_or_default(),
                    keys_map.get("SMS_SIGN_NAME").cloned().unwrap_or_default(),
                    keys_map.get("SMS_TEMPLATE_CODE").cloned().unwrap_or_default(),
                ))
            }
            "tencent" => {
                let keys_map = secrets
                    .get_many(&["SMS_TENCENT_SECRET_ID", "SMS_TENCENT_SECRET_KEY", "SMS_SIGN_NAME", "SMS_TEMPLATE_ID"])
                    .await
                    .unwrap_or_default();
                Box::new(TencentAdapter::new(
                    keys_map.get("SMS_TENCENT_SECRET_ID").cloned().unwrap_or_default(),
                    keys_map.get("SMS_TENCENT_SECRET_KEY").cloned().unwrap_or_default(),
                    keys_map.get("SMS_SIGN_NAME").cloned().unwrap_or_default(),
                    keys_map.get("SMS_TEMPLATE_ID").cloned().unwrap_or_default(),
                ))
            }
            "dev" => Box::new(DevAdapter::new(redis.clone())),
            "" => Box::new(NoopAdapter),
            other => {
                warn!(provider = %other, "unknown SMS_PROVIDER, falling back to dev stub");
                Box::new(DevAdapter::new(redis.clone()))
            }
        };

        let config = presets::http_external_config();
        Self {
            redis,
            adapter,
            breaker: CircuitBreaker::new(config.circuit_breaker),
        }
    }

    fn generate_code() -> String {
        let mut rng = rand::thread_rng();
        // byte % 10 has negligible bias for a six-digit human-facing code;
        // documented per §9 open question, not changed.
        (0..6).map(|_| rng.gen_range(0u8..10).to_string()).collect()
    }

    pub async fn send_code(&self, phone: &str) -> CoreResult<()> {
        let limit_key = keys::key_sms_limit(phone);
        {
            let mut conn = self.redis.lock().await;
            let ttl: i64 = conn.ttl(&limit_key).await.unwrap_or(-1);
            if ttl > 0 {
                return Err(CoreError::RateLimited { retry_after_sec: ttl as u64 });
            }
        }

        let code = Self::generate_code();
        let code_key = keys::key_sms_code(phone);

        {
            let mut conn = self.redis.lock().await;
            let _: () = conn.set_ex(&code_key, &code, CODE_TTL_SECS).await?;
            // Sentinel failure is non-fatal (§4.3 step 3): a lost rate-limit
            // window is far less harmful than failing the send outright.
            let _: Result<(), _> = conn.set_ex(&limit_key, "1", LIMIT_TTL_SECS).await;
        }

        let send_result = self
            .breaker
            .call(|| self.adapter.send(phone, &code))
            .await;

        if let Err(err) = send_result {
            warn!(%phone, error = %err, "sms delivery failed, clearing pending code");
            let mut conn = self.redis.lock().await;
            let _: Result<(), _> = conn.del(&code_key).await;
            // §7 policy: delivery failure is locally recovered — the caller
            // still gets 200 so a probe can't learn whether the phone exists.
            return Ok(());
        }

        info!(%phone, "sms code dispatched");
        Ok(())
    }

    pub async fn verify_code(&self, phone: &str, input: &str) -> CoreResult<()> {
        let code_key = keys::key_sms_code(phone);
        let stored: Option<String> = {
            let mut conn = self.redis.lock().await;
            conn.get(&code_key).await?
        };

        let stored = stored.ok_or(CoreError::CodeExpired)?;

        if stored.as_bytes().ct_eq(input.as_bytes()).unwrap_u8() != 1 {
            return Err(CoreError::InvalidCode);
        }

        let mut conn = self.redis.lock().await;
        let _: () = conn.del(&code_key).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_code_is_six_ascii_digits() {
        let code = SmsService::generate_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }
}
