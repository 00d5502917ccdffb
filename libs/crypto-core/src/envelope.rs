//! AES-256-GCM envelope used to protect values in the encrypted config store.
//!
//! Wire format (base64-encoded JSON):
//!
//! ```text
//! { "iv": "<hex 12-byte nonce>", "data": "<hex ciphertext+GCM-tag>" }
//! ```
//!
//! The 16-byte GCM authentication tag is appended to the ciphertext by
//! `Aes256Gcm::encrypt` and lives at the tail of `data`. Decryption verifies
//! the tag before returning plaintext; a tampered envelope yields a single
//! generic error so the cause is never surfaced to a caller (oracle avoidance).

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("encryption key must be 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("encryption key is not valid hex")]
    InvalidKeyEncoding,
    #[error("encryption failed")]
    Encryption,
    #[error("decryption failed: ciphertext may be tampered")]
    Decryption,
    #[error("malformed envelope")]
    MalformedEnvelope,
}

#[derive(Debug, Serialize, Deserialize)]
struct CipherPayload {
    iv: String,
    data: String,
}

/// Decodes a 64-character hex string into a 32-byte AES-256 key.
///
/// Call once at startup; a failure here should be treated as fatal
/// misconfiguration (`CONFIG_ENCRYPTION_KEY`).
pub fn parse_key(hex_key: &str) -> Result<[u8; 32], CryptoError> {
    if hex_key.len() != 64 {
        return Err(CryptoError::InvalidKeyLength(hex_key.len()));
    }
    let raw = hex::decode(hex_key).map_err(|_| CryptoError::InvalidKeyEncoding)?;
    raw.try_into()
        .map_err(|v: Vec<u8>| CryptoError::InvalidKeyLength(v.len()))
}

/// Encrypts `plaintext` with a fresh random 12-byte nonce and returns the
/// base64-JSON envelope. Identical plaintexts produce different ciphertexts.
pub fn encrypt(key: &[u8; 32], plaintext: &str) -> Result<String, CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let mut nonce_bytes = [0u8; 12];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|_| CryptoError::Encryption)?;

    let payload = CipherPayload {
        iv: hex::encode(nonce_bytes),
        data: hex::encode(ciphertext),
    };
    let raw = serde_json::to_vec(&payload).map_err(|_| CryptoError::Encryption)?;
    Ok(BASE64.encode(raw))
}

/// Reverses [`encrypt`]. Returns [`CryptoError::Decryption`] if the envelope
/// has been tampered with or the key is wrong; never surfaces the underlying
/// AEAD failure reason.
pub fn decrypt(key: &[u8; 32], encoded: &str) -> Result<String, CryptoError> {
    let raw = BASE64
        .decode(encoded)
        .map_err(|_| CryptoError::MalformedEnvelope)?;
    let payload: CipherPayload =
        serde_json::from_slice(&raw).map_err(|_| CryptoError::MalformedEnvelope)?;
    let nonce_bytes = hex::decode(&payload.iv).map_err(|_| CryptoError::MalformedEnvelope)?;
    let ciphertext = hex::decode(&payload.data).map_err(|_| CryptoError::MalformedEnvelope)?;
    if nonce_bytes.len() != 12 {
        return Err(CryptoError::MalformedEnvelope);
    }

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(&nonce_bytes);
    let plaintext = cipher
        .decrypt(nonce, ciphertext.as_slice())
        .map_err(|_| CryptoError::Decryption)?;
    String::from_utf8(plaintext).map_err(|_| CryptoError::Decryption)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> [u8; 32] {
        [7u8; 32]
    }

    #[test]
    fn round_trip_recovers_plaintext() {
        let key = test_key();
        let envelope = encrypt(&key, "USER_JWT_SECRET value").unwrap();
        let plain = decrypt(&key, &envelope).unwrap();
        assert_eq!(plain, "USER_JWT_SECRET value");
    }

    #[test]
    fn distinct_nonces_yield_distinct_ciphertexts() {
        let key = test_key();
        let a = encrypt(&key, "same value").unwrap();
        let b = encrypt(&key, "same value").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn tampered_byte_fails_to_decrypt() {
        let key = test_key();
        let mut envelope = encrypt(&key, "sensitive").unwrap();
        // flip a character well inside the base64 body
        let mid = envelope.len() / 2;
        let mut bytes = envelope.into_bytes();
        bytes[mid] ^= 0x01;
        envelope = String::from_utf8(bytes).unwrap();
        assert!(decrypt(&key, &envelope).is_err());
    }

    #[test]
    fn wrong_key_fails_to_decrypt() {
        let key = test_key();
        let other = [9u8; 32];
        let envelope = encrypt(&key, "sensitive").unwrap();
        assert!(decrypt(&other, &envelope).is_err());
    }

    #[test]
    fn parse_key_rejects_wrong_length() {
        assert!(parse_key("abcd").is_err());
    }

    #[test]
    fn parse_key_rejects_non_hex() {
        let not_hex = "z".repeat(64);
        assert!(parse_key(&not_hex).is_err());
    }
}
