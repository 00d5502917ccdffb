//! Request-shape validators for the `validator` crate, grounded on this
//! corpus's identity service (`validators.rs`: hardcoded `Lazy<Regex>`
//! patterns plus a `validator`-compatible wrapper function per field).

use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

// E.164: optional leading `+`, then 6-15 digits. Hardcoded and validated at
// authorship time, so `expect` is acceptable here (mirrors the teacher's own
// reasoning for its hardcoded email/username patterns).
static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[0-9]{6,15}$").expect("hardcoded phone regex is invalid - fix source code")
});

pub fn validate_phone_shape(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

/// `validator` crate compatible custom validator for the phone field.
pub fn validate_phone_shape_validator(phone: &str) -> Result<(), ValidationError> {
    if validate_phone_shape(phone) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plus_prefixed_e164() {
        assert!(validate_phone_shape("+8613800138000"));
    }

    #[test]
    fn accepts_bare_digits() {
        assert!(validate_phone_shape("13800138000"));
    }

    #[test]
    fn rejects_letters() {
        assert!(!validate_phone_shape("not-a-phone"));
    }

    #[test]
    fn rejects_too_short() {
        assert!(!validate_phone_shape("123"));
    }
}
