//! Liveness/readiness probes (§6 `GET /healthz`, `/readyz`).

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::state::AppState;

pub async fn healthz() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
struct ReadinessResponse {
    ready: bool,
    database: &'static str,
    kv: &'static str,
}

pub async fn readyz(state: web::Data<AppState>) -> HttpResponse {
    let db_ok = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();

    let kv_ok = {
        let mut conn = state.redis.lock().await;
        redis::cmd("PING").query_async::<_, String>(&mut *conn).await.is_ok()
    };

    let response = ReadinessResponse {
        ready: db_ok && kv_ok,
        database: if db_ok { "healthy" } else { "unhealthy" },
        kv: if kv_ok { "healthy" } else { "unhealthy" },
    };

    if response.ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}
