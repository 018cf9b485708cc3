//! Guards the operator routes with a shared API key.
//!
//! The key is registered as application data ([`AdminApiKey`]). Requests to a guarded route must then carry the same
//! value in the `x-api-key` header. When no key is configured, the guard lets every request through.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::*;
use spg_common::Secret;

use crate::{errors::ServerError, helpers::constant_time_eq};

pub const ADMIN_KEY_HEADER: &str = "x-api-key";

#[derive(Clone, Debug, Default)]
pub struct AdminApiKey(pub Secret<String>);

#[derive(Default)]
pub struct AdminKeyMiddlewareFactory;

impl AdminKeyMiddlewareFactory {
    pub fn new() -> Self {
        Self
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminKeyMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AdminKeyMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminKeyMiddlewareService { service: Rc::new(service) }))
    }
}

pub struct AdminKeyMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AdminKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let expected = req.app_data::<web::Data<AdminApiKey>>().map(|k| k.0.clone()).filter(|k| !k.is_empty());
        let Some(expected) = expected else {
            trace!("🔐️ No admin API key configured. Allowing request to {}", req.path());
            return Box::pin(service.call(req));
        };
        let supplied = req.headers().get(ADMIN_KEY_HEADER).and_then(|v| v.to_str().ok()).unwrap_or_default();
        if constant_time_eq(expected.reveal(), supplied.trim()) {
            trace!("🔐️ Admin API key for {} ✅️", req.path());
            Box::pin(service.call(req))
        } else {
            warn!("🔐️ Missing or invalid admin API key for {}. Denying access.", req.path());
            let err = Error::from(ServerError::Unauthorized("A valid API key is required.".into()));
            Box::pin(ready(Err::<ServiceResponse<B>, Error>(err)))
        }
    }
}
