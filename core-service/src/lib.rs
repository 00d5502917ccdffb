//! The session/token/push core: SMS auth, dual-audience JWT, device-cap
//! eviction, replay-safe refresh rotation, encrypted config store,
//! WebSocket fan-out, admin auth, and the upstream proxy cache.
//!
//! Split into a library target so integration tests under `tests/` can
//! exercise the real subsystems (`SessionManager`, `TokenService`, ...)
//! against a live Postgres/Redis, the same way this corpus's other
//! services expose their modules for their own `tests/` suites.

pub mod admin_auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod proxy;
pub mod routes;
pub mod secret_store;
pub mod session;
pub mod sms;
pub mod state;
pub mod telemetry;
pub mod token;
pub mod validators;
pub mod ws;
