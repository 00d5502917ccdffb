//! End-user auth endpoints (§6): SMS send/verify, refresh, logout, device list.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{CoreError, CoreResult};
use crate::middleware::AuthedUser;
use crate::state::AppState;
use crate::validators::validate_phone_shape_validator;

#[derive(Debug, Deserialize, Validate)]
pub struct SendCodeRequest {
    #[validate(custom(function = "validate_phone_shape_validator"))]
    pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub message: &'static str,
}

pub async fn send_code(state: web::Data<AppState>, body: web::Json<SendCodeRequest>) -> CoreResult<HttpResponse> {
    body.validate().map_err(|_| CoreError::InvalidPhone)?;
    state.sms.send_code(&body.phone).await?;
    Ok(HttpResponse::Ok().json(OkResponse { message: "ok" }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyCodeRequest {
    #[validate(custom(function = "validate_phone_shape_validator"))]
    pub phone: String,
    #[validate(length(equal = 6))]
    pub code: String,
    pub device_id: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub device_id: String,
}

pub async fn verify_code(state: web::Data<AppState>, body: web::Json<VerifyCodeRequest>) -> CoreResult<HttpResponse> {
    body.validate().map_err(|_| CoreError::InvalidPhone)?;
    state.sms.verify_code(&body.phone, &body.code).await?;

    let result = state
        .sessions
        .login(&body.phone, body.device_id.clone(), body.platform.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token: result.access_token,
        refresh_token: result.refresh_token,
        expires_in: result.expires_in,
        device_id: result.device_id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
    pub device_id: String,
}

pub async fn refresh(state: web::Data<AppState>, body: web::Json<RefreshRequest>) -> CoreResult<HttpResponse> {
    let result = state.sessions.refresh(&body.refresh_token, &body.device_id).await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token: result.access_token,
        refresh_token: result.refresh_token,
        expires_in: result.expires_in,
        device_id: result.device_id,
    }))
}

pub async fn logout(state: web::Data<AppState>, user: AuthedUser) -> CoreResult<HttpResponse> {
    state.sessions.logout(user.user_id, &user.device_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn list_devices(state: web::Data<AppState>, user: AuthedUser) -> CoreResult<HttpResponse> {
    let devices = state.sessions.list_devices(user.user_id).await?;
    Ok(HttpResponse::Ok().json(devices))
}

pub async fn delete_device(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<String>,
) -> CoreResult<HttpResponse> {
    let device_id = path.into_inner();
    if device_id == user.device_id {
        return Err(CoreError::InvalidRequest);
    }
    state.sessions.logout(user.user_id, &device_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_code_request_accepts_plus_prefixed_digits() {
        let req = SendCodeRequest { phone: "+8613800138000".to_string() };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn send_code_request_rejects_letters() {
        let req = SendCodeRequest { phone: "not-a-phone".to_string() };
        assert!(req.validate().is_err());
    }

    #[test]
    fn send_code_request_rejects_too_short() {
        let req = SendCodeRequest { phone: "123".to_string() };
        assert!(req.validate().is_err());
    }

    #[test]
    fn verify_code_request_rejects_wrong_length_code() {
        let req = VerifyCodeRequest {
            phone: "+8613800138000".to_string(),
            code: "12345".to_string(),
            device_id: None,
            platform: None,
        };
        assert!(req.validate().is_err());
    }
}
