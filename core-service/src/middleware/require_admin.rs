use std::future::{ready, Future, Ready};
use std::pin::Pin;
use std::rc::Rc;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, FromRequest, HttpMessage, ResponseError};
use uuid::Uuid;

use crate::db::admins;
use crate::error::CoreError;
use crate::models::AdminRole;
use crate::state::AppState;

use super::extract_bearer;

#[derive(Debug, Clone)]
pub struct AuthedAdmin {
    pub admin_id: Uuid,
    pub username: String,
    pub role: AdminRole,
}

impl FromRequest for AuthedAdmin {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        match req.extensions().get::<AuthedAdmin>() {
            Some(identity) => ready(Ok(identity.clone())),
            None => ready(Err(actix_web::error::ErrorUnauthorized("missing admin identity"))),
        }
    }
}

pub struct RequireAdmin;

impl<S, B> Transform<S, ServiceRequest> for RequireAdmin
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequireAdminService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAdminService { service: Rc::new(service) }))
    }
}

pub struct RequireAdminService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireAdminService<S>
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

            let claims = state.tokens.verify_admin(&token).await.map_err(map_auth_err)?;

            let admin = admins::find_by_id(&state.pool, claims.sub)
                .await
                .map_err(CoreError::from)
                .map_err(map_auth_err)?
                .ok_or(CoreError::Unauthenticated)
                .map_err(map_auth_err)?;

            if admin.disabled {
                return Err(map_auth_err(CoreError::AccountDisabled));
            }

            req.extensions_mut().insert(AuthedAdmin {
                admin_id: admin.id,
                username: admin.username,
                role: admin.role(),
            });

            service.call(req).await
        })
    }
}

fn map_auth_err(err: CoreError) -> actix_web::Error {
    actix_web::error::InternalError::from_response(err.to_string(), err.error_response()).into()
}
