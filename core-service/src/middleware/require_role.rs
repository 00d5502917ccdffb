use std::future::{ready, Future, Ready};
use std::pin::Pin;
use std::rc::Rc;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage, ResponseError};

use crate::error::CoreError;

use super::{AuthedAdmin, AuthedUser};

/// Gate on the numerical rank already attached by [`RequireAdmin`] or
/// [`RequireUser`] (§4.8: `USER=0 < ADMIN=1 < SUPER_ADMIN=2`). Must be
/// `.wrap()`-ed inside one of those two, never standalone.
pub struct RequireRole {
    min_rank: u8,
}

impl RequireRole {
    pub fn new(min_rank: u8) -> Self {
        Self { min_rank }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequireRoleService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleService { service: Rc::new(service), min_rank: self.min_rank }))
    }
}

pub struct RequireRoleService<S> {
    service: Rc<S>,
    min_rank: u8,
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
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
        let min_rank = self.min_rank;

        Box::pin(async move {
            let rank = req
                .extensions()
                .get::<AuthedAdmin>()
                .map(|a| a.role.rank())
                .or_else(|| req.extensions().get::<AuthedUser>().map(|u| u.role.rank()));

            match rank {
                Some(rank) if rank >= min_rank => service.call(req).await,
                _ => Err(map_auth_err(CoreError::PermissionDenied)),
            }
        })
    }
}

fn map_auth_err(err: CoreError) -> actix_web::Error {
    actix_web::error::InternalError::from_response(err.to_string(), err.error_response()).into()
}
