//! Cached upstream passthrough (§6 `GET /api/**`, C6).

use actix_web::{web, HttpRequest, HttpResponse};

use crate::error::CoreResult;
use crate::middleware::AuthedUser;
use crate::state::AppState;

pub async fn passthrough(
    req: HttpRequest,
    state: web::Data<AppState>,
    _user: AuthedUser,
) -> CoreResult<HttpResponse> {
    let path = req.path().strip_prefix("/api").unwrap_or(req.path());
    let raw_query = req.query_string();
    let if_none_match = req
        .headers()
        .get("If-None-Match")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    match state.proxy.fetch(path, raw_query, if_none_match.as_deref()).await? {
        None => Ok(HttpResponse::NotModified().finish()),
        Some(cached) => Ok(HttpResponse::Ok()
            .insert_header(("ETag", cached.etag))
            .insert_header(("X-Cache", cached.cache_status))
            .content_type("application/json")
            .body(cached.body)),
    }
}
