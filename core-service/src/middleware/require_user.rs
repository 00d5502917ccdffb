use std::future::{ready, Future, Ready};
use std::pin::Pin;
use std::rc::Rc;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, FromRequest, HttpMessage, ResponseError};
use uuid::Uuid;

use crate::db::users;
use crate::error::CoreError;
use crate::models::UserRole;
use crate::state::AppState;

use super::extract_bearer;

/// Identity attached to the request by [`RequireUser`]; handlers pull it
/// out as an extractor argument.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub user_id: Uuid,
    pub device_id: String,
    pub role: UserRole,
}

impl FromRequest for AuthedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        match req.extensions().get::<AuthedUser>() {
            Some(identity) => ready(Ok(identity.clone())),
            None => ready(Err(actix_web::error::ErrorUnauthorized("missing user identity"))),
        }
    }
}

pub struct RequireUser;

impl<S, B> Transform<S, ServiceRequest> for RequireUser
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequireUserService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireUserService { service: Rc::new(service) }))
    }
}

pub struct RequireUserService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireUserService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let token = extract_bearer(req.request()).map_err(map_auth_err)?;

            let state = req
                .app_data::<web::Data<AppState>>()
                .cloned()
                .ok_or_else(|| actix_web::error::ErrorInternalServerError("app state missing"))?;

            let claims = state.tokens.verify_user(&token).await.map_err(map_auth_err)?;

            let user = users::find_by_id(&state.pool, claims.sub)
                .await
                .map_err(CoreError::from)
                .map_err(map_auth_err)?
                .ok_or(CoreError::Unauthenticated)
                .map_err(map_auth_err)?;

            if user.disabled {
                return Err(map_auth_err(CoreError::UserDisabled));
            }

            req.extensions_mut().insert(AuthedUser {
                user_id: user.id,
                device_id: claims.device_id,
                role: user.role(),
            });

            service.call(req).await
        })
    }
}

fn map_auth_err(err: CoreError) -> actix_web::Error {
    actix_web::error::InternalError::from_response(err.to_string(), err.error_response()).into()
}
