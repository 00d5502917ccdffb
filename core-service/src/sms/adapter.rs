//! Pluggable SMS delivery adapters (§4.3, §9 "dynamic polymorphism over SMS
//! vendors"). `SmsAdapter` is the single-method capability every concrete
//! vendor integration implements; the active one is chosen at startup from
//! the `SMS_PROVIDER` config key.

use async_trait::async_trait;
use redis_utils::{keys, kv, SharedConnectionManager};
use tracing::{info, warn};

#[async_trait]
pub trait SmsAdapter: Send + Sync {
    async fn send(&self, phone: &str, code: &str) -> anyhow::Result<()>;
}

/// Aliyun Dayu SMS. The HTTP signing scheme is an external-collaborator
/// boundary (§1 Out-of-scope); only the single `send` surface is modeled.
pub struct AliyunAdapter {
    client: reqwest::Client,
    access_key_id: String,
    access_key_secret: String,
    sign_name: String,
    template_code: String,
}

impl AliyunAdapter {
    pub fn new(access_key_id: String, access_key_secret: String, sign_name: String, template_code: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_key_id,
            access_key_secret,
            sign_name,
            template_code,
        }
    }
}

#[async_trait]
impl SmsAdapter for AliyunAdapter {
    async fn send(&self, phone: &str, code: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .post("https://dysmsapi.aliyuncs.com/")
            .query(&[
                ("PhoneNumbers", phone),
                ("SignName", self.sign_name.as_str()),
                ("TemplateCode", self.template_code.as_str()),
                ("TemplateParam", &format!("{{\"code\":\"{code}\"}}")),
                ("AccessKeyId", self.access_key_id.as_str()),
            ])
            .basic_auth(&self.access_key_id, Some(&self.access_key_secret))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("aliyun sms send failed: {}", response.status());
        }
        Ok(())
    }
}

/// Tencent Cloud SMS.
pub struct TencentAdapter {
    client: reqwest::Client,
    secret_id: String,
    secret_key: String,
    sign_name: String,
    template_id: String,
}

impl TencentAdapter {
    pub fn new(secret_id: String, secret_key: String, sign_name: String, template_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_id,
            secret_key,
            sign_name,
            template_id,
        }
    }
}

#[async_trait]
impl SmsAdapter for TencentAdapter {
    async fn send(&self, phone: &str, code: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .post("https://sms.tencentcloudapi.com/")
            .query(&[
                ("PhoneNumberSet", phone),
                ("SignName", self.sign_name.as_str()),
                ("TemplateId", self.template_id.as_str()),
                ("TemplateParamSet", code),
            ])
            .basic_auth(&self.secret_id, Some(&self.secret_key))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("tencent sms send failed: {}", response.status());
        }
        Ok(())
    }
}

/// Local development stub: never calls out to a vendor. Logs the code at
/// `info` and records it in the KV dev ring (§3 "Dev SMS ring") so a local
/// frontend can read it back without a real phone.
pub struct DevAdapter {
    redis: SharedConnectionManager,
}

impl DevAdapter {
    pub fn new(redis: SharedConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl SmsAdapter for DevAdapter {
    async fn send(&self, phone: &str, code: &str) -> anyhow::Result<()> {
        info!(%phone, %code, "dev sms adapter: code issued (not actually sent)");

        let sent_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        let record = serde_json::json!({ "phone": phone, "code": code, "sent_at": sent_at }).to_string();

        if let Err(err) = kv::zadd_trim(&self.redis, &keys::key_sms_devlog(), &record, sent_at as f64, 200).await {
            warn!(error = %err, "failed to append to dev sms ring, continuing");
        }
        Ok(())
    }
}

/// Selected when `SMS_PROVIDER` is empty or absent: any send attempt fails
/// loudly rather than silently succeeding, so a misconfigured production
/// deployment cannot ship SMS delivery that quietly never happens.
pub struct NoopAdapter;

#[async_trait]
impl SmsAdapter for NoopAdapter {
    async fn send(&self, _phone: &str, _code: &str) -> anyhow::Result<()> {
        anyhow::bail!("no SMS provider configured (SMS_PROVIDER unset)")
    }
}
