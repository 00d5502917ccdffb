//! Argon2id hashing at the exact parameters specified in §4.5: time cost 1,
//! 64 MiB memory, 4 lanes, 32-byte output key, 16-byte salt.

use argon2::password_hash::{PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, Version};
use rand::RngCore;

fn argon2id() -> Argon2<'static> {
    let params = Params::new(64 * 1024, 1, 4, Some(32)).expect("static argon2 params are valid");
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)?;

    let hash = argon2id().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    argon2id().verify_password(password.as_bytes(), &parsed).is_ok()
}

/// `≥12 chars, ≥1 lower, ≥1 upper, ≥1 digit, ≥1 non-alphanumeric` (§4.5 bootstrap).
pub fn meets_strength_requirements(password: &str) -> bool {
    if password.chars().count() < 12 {
        return false;
    }
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_alphanumeric());
    has_lower && has_upper && has_digit && has_symbol
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("Str0ng!Password").unwrap();
        assert!(verify_password("Str0ng!Password", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn strength_rejects_short_password() {
        assert!(!meets_strength_requirements("Short1!"));
    }

    #[test]
    fn strength_accepts_compliant_password() {
        assert!(meets_strength_requirements("Str0ng!Password"));
    }

    #[test]
    fn strength_rejects_missing_symbol() {
        assert!(!meets_strength_requirements("StrongPassword1"));
    }
}
