//! Uniform error taxonomy for the session/token/push core.
//!
//! A single `CoreError` converges every module's failure modes so the HTTP
//! layer renders one `{code, message}` JSON shape (see spec §7). Library
//! errors convert in via `#[from]`; the conversion site is where we log the
//! real cause, because the response body never carries it (the encrypted
//! config oracle-avoidance rule generalizes to every error path here).

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    // 400
    #[error("invalid request")]
    InvalidRequest,
    #[error("invalid phone number")]
    InvalidPhone,
    #[error("invalid code")]
    InvalidCode,
    #[error("code expired")]
    CodeExpired,
    #[error("missing parameter: {0}")]
    MissingParam(&'static str),
    #[error("invalid request body")]
    InvalidBody,
    #[error("password does not meet strength requirements")]
    WeakPassword,

    // 401
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
    #[error("refresh token reused")]
    TokenReused,
    #[error("device revoked")]
    DeviceRevoked,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("totp code required")]
    TotpRequired,
    #[error("invalid totp code")]
    InvalidTotp,

    // 403
    #[error("account disabled")]
    AccountDisabled,
    #[error("user disabled")]
    UserDisabled,
    #[error("already initialized")]
    AlreadyInitialized,
    #[error("cannot disable self")]
    CannotDisableSelf,
    #[error("permission denied")]
    PermissionDenied,

    // 404
    #[error("device not found")]
    DeviceNotFound,
    #[error("not found")]
    NotFound,

    // 429
    #[error("rate limited, retry after {retry_after_sec}s")]
    RateLimited { retry_after_sec: u64 },
    #[error("account locked until {unlock_at}")]
    AccountLocked { unlock_at: chrono::DateTime<chrono::Utc> },

    // 500
    #[error("internal error")]
    Internal,

    // 502
    #[error("upstream error")]
    UpstreamError,
    #[error("service unavailable")]
    ServiceUnavailable,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unlock_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl CoreError {
    fn code(&self) -> &'static str {
        match self {
            CoreError::InvalidRequest => "INVALID_REQUEST",
            CoreError::InvalidPhone => "INVALID_PHONE",
            CoreError::InvalidCode => "INVALID_CODE",
            CoreError::CodeExpired => "CODE_EXPIRED",
            CoreError::MissingParam(_) => "MISSING_PARAM",
            CoreError::InvalidBody => "INVALID_BODY",
            CoreError::WeakPassword => "WEAK_PASSWORD",
            CoreError::Unauthenticated => "UNAUTHENTICATED",
            CoreError::InvalidToken => "INVALID_TOKEN",
            CoreError::TokenExpired => "TOKEN_EXPIRED",
            CoreError::TokenReused => "TOKEN_REUSED",
            CoreError::DeviceRevoked => "DEVICE_REVOKED",
            CoreError::InvalidCredentials => "INVALID_CREDENTIALS",
            CoreError::TotpRequired => "TOTP_REQUIRED",
            CoreError::InvalidTotp => "INVALID_TOTP",
            CoreError::AccountDisabled => "ACCOUNT_DISABLED",
            CoreError::UserDisabled => "USER_DISABLED",
            CoreError::AlreadyInitialized => "ALREADY_INITIALIZED",
            CoreError::CannotDisableSelf => "CANNOT_DISABLE_SELF",
            CoreError::PermissionDenied => "PERMISSION_DENIED",
            CoreError::DeviceNotFound => "DEVICE_NOT_FOUND",
            CoreError::NotFound => "NOT_FOUND",
            CoreError::RateLimited { .. } => "RATE_LIMITED",
            CoreError::AccountLocked { .. } => "ACCOUNT_LOCKED",
            CoreError::Internal => "INTERNAL_ERROR",
            CoreError::UpstreamError => "UPSTREAM_ERROR",
            CoreError::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

impl ResponseError for CoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            CoreError::InvalidRequest
            | CoreError::InvalidPhone
            | CoreError::InvalidCode
            | CoreError::CodeExpired
            | CoreError::MissingParam(_)
            | CoreError::InvalidBody
            | CoreError::WeakPassword => StatusCode::BAD_REQUEST,

            CoreError::Unauthenticated
            | CoreError::InvalidToken
            | CoreError::TokenExpired
            | CoreError::TokenReused
            | CoreError::DeviceRevoked
            | CoreError::InvalidCredentials
            | CoreError::TotpRequired
            | CoreError::InvalidTotp => StatusCode::UNAUTHORIZED,

            CoreError::AccountDisabled
            | CoreError::UserDisabled
            | CoreError::AlreadyInitialized
            | CoreError::CannotDisableSelf
            | CoreError::PermissionDenied => StatusCode::FORBIDDEN,

            CoreError::DeviceNotFound | CoreError::NotFound => StatusCode::NOT_FOUND,

            CoreError::RateLimited { .. } | CoreError::AccountLocked { .. } => {
                StatusCode::TOO_MANY_REQUESTS
            }

            CoreError::Internal => StatusCode::INTERNAL_SERVER_ERROR,

            CoreError::UpstreamError | CoreError::ServiceUnavailable => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (retry_after, unlock_at) = match self {
            CoreError::RateLimited { retry_after_sec } => (Some(*retry_after_sec), None),
            CoreError::AccountLocked { unlock_at } => (None, Some(*unlock_at)),
            _ => (None, None),
        };

        HttpResponse::build(self.status_code()).json(ErrorBody {
            code: self.code(),
            message: self.to_string(),
            retry_after,
            unlock_at,
        })
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        error!(error = %err, "database error");
        CoreError::Internal
    }
}

impl From<redis::RedisError> for CoreError {
    fn from(err: redis::RedisError) -> Self {
        error!(error = %err, "redis error");
        CoreError::Internal
    }
}

impl From<anyhow::Error> for CoreError {
    fn from(err: anyhow::Error) -> Self {
        error!(error = %err, "unexpected error");
        CoreError::Internal
    }
}

impl From<jsonwebtoken::errors::Error> for CoreError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => CoreError::TokenExpired,
            _ => CoreError::InvalidToken,
        }
    }
}

impl From<crypto_core::CryptoError> for CoreError {
    fn from(err: crypto_core::CryptoError) -> Self {
        error!(error = %err, "crypto error");
        CoreError::Internal
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        error!(error = %err, "upstream http error");
        CoreError::UpstreamError
    }
}

impl From<crate::secret_store::SecretError> for CoreError {
    fn from(err: crate::secret_store::SecretError) -> Self {
        error!(error = %err, "secret store error");
        CoreError::Internal
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
