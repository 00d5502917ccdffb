//! Low-level cryptographic primitives shared by every service.
//!
//! `envelope` implements the AES-256-GCM codec used by the encrypted
//! configuration store; `hash` provides the SHA-256 helper used for
//! refresh-token hashing and ETag computation.

pub mod envelope;
pub mod hash;

pub use envelope::{decrypt, encrypt, parse_key, CryptoError};
pub use hash::sha256;
