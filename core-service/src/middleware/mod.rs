//! Authentication gates (C8), grounded on this corpus's `JwtAuthMiddleware`
//! `Transform`/`Service` pair: extract bearer, verify, stash identity on the
//! request extensions for handlers to pull out via a `FromRequest` impl.
//! Unlike that middleware we don't cache validation in Redis — every
//! verification already hits the secret store's 30s in-memory cache, so a
//! second cache layer would buy nothing.

pub mod require_admin;
pub mod require_role;
pub mod require_user;

pub use require_admin::{AuthedAdmin, RequireAdmin};
pub use require_role::RequireRole;
pub use require_user::{AuthedUser, RequireUser};

use actix_web::HttpRequest;

use crate::error::CoreError;

/// Pulls a bearer token from `Authorization: Bearer …`, falling back to
/// `?token=…` for WebSocket upgrade requests, which cannot set arbitrary
/// headers from a browser (§4.7 step 1).
pub(crate) fn extract_bearer(req: &HttpRequest) -> Result<String, CoreError> {
    if let Some(header) = req.headers().get("Authorization") {
        let value = header.to_str().map_err(|_| CoreError::Unauthenticated)?;
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Ok(token.to_string());
        }
    }

    if let Some(token) = req
        .uri()
        .query()
        .and_then(|q| url::form_urlencoded::parse(q.as_bytes()).find(|(k, _)| k == "token"))
        .map(|(_, v)| v.into_owned())
    {
        return Ok(token);
    }

    Err(CoreError::Unauthenticated)
}
