//! RFC 6238 TOTP, grounded on this corpus's `TOTPGenerator`: same 20-byte
//! secret, same `totp_lite::totp::<Sha1>` single 30-second window, same
//! base64 encoding for storage.

use base64::engine::general_purpose::STANDARD as base64_engine;
use base64::Engine as _;
use rand::RngCore;
use totp_lite::{totp, Sha1};

const TIME_STEP_SECS: u64 = 30;
const SECRET_LEN: usize = 20;

pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64_engine.encode(bytes)
}

pub fn provisioning_uri(secret_b64: &str, issuer: &str, account: &str) -> String {
    format!(
        "otpauth://totp/{issuer}:{account}?secret={secret}&issuer={issuer}&algorithm=SHA1&digits=6&period=30",
        issuer = urlencoding::encode(issuer),
        account = urlencoding::encode(account),
        secret = secret_b64,
    )
}

fn current_code(secret_b64: &str) -> Option<String> {
    let secret = base64_engine.decode(secret_b64).ok()?;
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .ok()?
        .as_secs();
    let time_step = now / TIME_STEP_SECS;
    let generated = totp::<Sha1>(&secret, time_step);
    Some(format!("{:06}", generated))
}

/// Single-window check, per §4.5: no clock-skew tolerance window is granted.
pub fn verify_code(secret_b64: &str, code: &str) -> bool {
    match current_code(secret_b64) {
        Some(expected) => expected == code,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secret_round_trips_through_verify() {
        let secret = generate_secret();
        let code = current_code(&secret).unwrap();
        assert!(verify_code(&secret, &code));
    }

    #[test]
    fn wrong_code_is_rejected() {
        let secret = generate_secret();
        assert!(!verify_code(&secret, "000000"));
    }
}
