//! Admin-auth and admin-operations endpoints (§6).

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::db::admins;
use crate::error::{CoreError, CoreResult};
use crate::middleware::AuthedAdmin;
use crate::models::AdminRole;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SetupStatusResponse {
    pub initialized: bool,
}

pub async fn setup_status(state: web::Data<AppState>) -> CoreResult<HttpResponse> {
    let initialized = admins::count(&state.pool).await? > 0;
    Ok(HttpResponse::Ok().json(SetupStatusResponse { initialized }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetupInitRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    // Length-only here; the actual strength rules (§4.5 bootstrap) live in
    // `admin_auth::password::meets_strength_requirements` so a failure maps
    // to the more specific `WEAK_PASSWORD` code rather than `INVALID_BODY`.
    pub password: String,
    #[serde(default)]
    pub site_settings: std::collections::HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct SetupInitResponse {
    pub admin_id: Uuid,
}

pub async fn setup_init(state: web::Data<AppState>, body: web::Json<SetupInitRequest>) -> CoreResult<HttpResponse> {
    body.validate().map_err(|_| CoreError::InvalidBody)?;

    let settings: Vec<(&str, &str)> = body
        .site_settings
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let admin_id = state.admin_auth.bootstrap(&body.username, &body.password, &settings).await?;
    Ok(HttpResponse::Created().json(SetupInitResponse { admin_id }))
}

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
    pub totp_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub role: &'static str,
}

pub async fn login(
    req: actix_web::HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<AdminLoginRequest>,
) -> CoreResult<HttpResponse> {
    let client_ip = req.peer_addr().map(|addr| addr.ip().to_string());
    let result = state
        .admin_auth
        .login(&body.username, &body.password, body.totp_code.as_deref(), client_ip.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(AdminLoginResponse {
        access_token: result.access_token,
        expires_in: result.expires_in,
        role: result.role.as_str(),
    }))
}

pub async fn kick_device(
    state: web::Data<AppState>,
    admin: AuthedAdmin,
    path: web::Path<String>,
) -> CoreResult<HttpResponse> {
    let device_id = path.into_inner();
    let device = crate::db::devices::find_by_device_id(&state.pool, &device_id)
        .await?
        .ok_or(CoreError::DeviceNotFound)?;
    state.sessions.admin_kick_device(device.user_id, &device_id).await?;

    let pool = state.pool.clone();
    let admin_id = admin.admin_id;
    tokio::spawn(async move {
        crate::db::operation_log::append(
            &pool,
            admin_id,
            crate::models::operation_log::action::DEVICE_KICKED,
            Some(&device_id),
            None,
            None,
            None,
        )
        .await;
    });

    Ok(HttpResponse::NoContent().finish())
}

pub async fn disable_user(
    state: web::Data<AppState>,
    admin: AuthedAdmin,
    path: web::Path<Uuid>,
) -> CoreResult<HttpResponse> {
    let user_id = path.into_inner();

    if admin.role == AdminRole::SuperAdmin && admin.admin_id == user_id {
        return Err(CoreError::CannotDisableSelf);
    }

    state.sessions.disable_user_cascade(user_id).await?;

    let pool = state.pool.clone();
    let admin_id = admin.admin_id;
    tokio::spawn(async move {
        crate::db::operation_log::append(
            &pool,
            admin_id,
            crate::models::operation_log::action::USER_DISABLED,
            Some(&user_id.to_string()),
            None,
            None,
            None,
        )
        .await;
    });

    Ok(HttpResponse::NoContent().finish())
}

#[derive(Debug, Deserialize)]
pub struct RotateJwtRequest {
    pub secret_key: String,
}

#[derive(Debug, Serialize)]
pub struct RotateJwtResponse {
    pub affected_sessions: u64,
}

pub async fn rotate_jwt(
    state: web::Data<AppState>,
    admin: AuthedAdmin,
    body: web::Json<RotateJwtRequest>,
) -> CoreResult<HttpResponse> {
    let actor = admins::find_by_id(&state.pool, admin.admin_id)
        .await?
        .ok_or(CoreError::Unauthenticated)?;

    let affected_sessions = state.admin_auth.rotate_key(&actor, &body.secret_key).await?;
    Ok(HttpResponse::Ok().json(RotateJwtResponse { affected_sessions }))
}
