//! Dual-audience JWT issuance/verification plus refresh-token minting (C2).
//!
//! Two independently-keyed HS256 signers: `USER_JWT_SECRET` for end-user
//! access tokens (`aud=["user"]`) and `ADMIN_JWT_SECRET` for staff access
//! tokens (`aud=["admin"]`). Both keys are read through the secret store on
//! every sign/verify call, so a rotation (§4.5) takes effect for new
//! verifications within one 30s cache window without a redeploy.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreResult;
use crate::secret_store::SecretStore;

const DEFAULT_ACCESS_TTL_SECS: i64 = 7_200;
const DEFAULT_REFRESH_TTL_SECS: i64 = 2_592_000;

const USER_AUDIENCE: &str = "user";
const ADMIN_AUDIENCE: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: Uuid,
    pub aud: String,
    pub device_id: String,
    pub role: String,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: Uuid,
    pub aud: String,
    pub username: String,
    pub role: String,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Plaintext delivered to the client once; only `hash` is ever persisted.
pub struct RefreshPair {
    pub plaintext: String,
    pub hash: String,
}

pub struct TokenService {
    secrets: std::sync::Arc<SecretStore>,
}

impl TokenService {
    pub fn new(secrets: std::sync::Arc<SecretStore>) -> Self {
        Self { secrets }
    }

    async fn access_ttl(&self) -> i64 {
        self.secrets
            .get_or_parse("ACCESS_TOKEN_TTL", DEFAULT_ACCESS_TTL_SECS)
            .await
    }

    pub async fn refresh_ttl(&self) -> i64 {
        self.secrets
            .get_or_parse("REFRESH_TOKEN_TTL", DEFAULT_REFRESH_TTL_SECS)
            .await
    }

    pub async fn sign_user(
        &self,
        user_id: Uuid,
        device_id: &str,
        role: &str,
    ) -> CoreResult<(String, i64)> {
        let secret = self.secrets.get("USER_JWT_SECRET").await?;
        let ttl = self.access_ttl().await;
        let now = Utc::now().timestamp();

        let claims = UserClaims {
            sub: user_id,
            aud: USER_AUDIENCE.to_string(),
            device_id: device_id.to_string(),
            role: role.to_string(),
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + ttl,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;
        Ok((token, ttl))
    }

    pub async fn verify_user(&self, token: &str) -> CoreResult<UserClaims> {
        let secret = self.secrets.get("USER_JWT_SECRET").await?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256];
        validation.set_audience(&[USER_AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "aud"]);

        let data = decode::<UserClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )?;
        Ok(data.claims)
    }

    pub async fn sign_admin(&self, admin_id: Uuid, username: &str, role: &str) -> CoreResult<(String, i64)> {
        let secret = self.secrets.get("ADMIN_JWT_SECRET").await?;
        let ttl = self.access_ttl().await;
        let now = Utc::now().timestamp();

        let claims = AdminClaims {
            sub: admin_id,
            aud: ADMIN_AUDIENCE.to_string(),
            username: username.to_string(),
            role: role.to_string(),
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + ttl,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;
        Ok((token, ttl))
    }

    pub async fn verify_admin(&self, token: &str) -> CoreResult<AdminClaims> {
        let secret = self.secrets.get("ADMIN_JWT_SECRET").await?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256];
        validation.set_audience(&[ADMIN_AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "aud"]);

        let data = decode::<AdminClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )?;
        Ok(data.claims)
    }

    /// 128-bit opaque refresh token plus its SHA-256 hash. The hash is the
    /// only form ever persisted (KV + device row); the plaintext is returned
    /// to the client exactly once.
    pub fn mint_refresh(&self) -> RefreshPair {
        let plaintext = Uuid::new_v4().to_string().replace('-', "");
        let hash = hex::encode(crypto_core::sha256(plaintext.as_bytes()));
        RefreshPair { plaintext, hash }
    }

    pub fn hash_refresh(&self, plaintext: &str) -> String {
        hex::encode(crypto_core::sha256(plaintext.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn hash_refresh_is_deterministic() {
        let hashed_a = hex::encode(crypto_core::sha256(b"same-token"));
        let hashed_b = hex::encode(crypto_core::sha256(b"same-token"));
        assert_eq!(hashed_a, hashed_b);
        assert_eq!(hashed_a.len(), 64);
    }

    #[test]
    fn distinct_tokens_hash_differently() {
        let a = hex::encode(crypto_core::sha256(b"token-a"));
        let b = hex::encode(crypto_core::sha256(b"token-b"));
        assert_ne!(a, b);
    }
}
