//! Webhook authentication middleware for Actix Web.
//!
//! Each payment gateway proves that a webhook call is genuine in its own way. The middleware supports the two schemes
//! in use:
//! * [`WebhookAuthMode::Hmac`]: the configured header carries an HMAC-SHA256 of the raw request body, keyed with the
//!   shared secret.
//! * [`WebhookAuthMode::Token`]: the configured header carries the shared secret itself.
//!
//! Wrap the `/webhook` scope with [`WebhookAuthMiddlewareFactory`]. The gateway is identified from the last segment of
//! the request path (e.g. `/webhook/asaas`). Gateways without authentication configured are let through.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::*;
use spice_payment_engine::PaymentGateway;

use crate::{
    config::{WebhookAuth, WebhookAuthMode, WebhookConfig},
    errors::ServerError,
    helpers::{constant_time_eq, signature_matches},
};

const GATEWAYS: [PaymentGateway; 3] = [PaymentGateway::InfinitePay, PaymentGateway::PagSeguro, PaymentGateway::Asaas];

pub struct WebhookAuthMiddlewareFactory {
    config: Rc<WebhookConfig>,
}

impl WebhookAuthMiddlewareFactory {
    pub fn new(config: WebhookConfig) -> Self {
        Self { config: Rc::new(config) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for WebhookAuthMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = WebhookAuthMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(WebhookAuthMiddlewareService { config: Rc::clone(&self.config), service: Rc::new(service) }))
    }
}

pub struct WebhookAuthMiddlewareService<S> {
    config: Rc<WebhookConfig>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for WebhookAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let auth = gateway_for_path(req.path()).and_then(|g| self.config.auth_for(g).cloned().map(|a| (g, a)));
        Box::pin(async move {
            let Some((gateway, auth)) = auth else {
                trace!("🔐️ No webhook authentication configured for {}. Allowing request.", req.path());
                return service.call(req).await;
            };
            if auth.secret.is_empty() {
                warn!("🔐️ Webhook authentication for {gateway} has no secret configured. Denying access.");
                return Err(unauthorized("Webhook authentication is misconfigured."));
            }
            let Some(value) = req.headers().get(&auth.header).and_then(|v| v.to_str().ok()).map(String::from) else {
                warn!("🔐️ No '{}' header in {gateway} webhook request. Denying access.", auth.header);
                return Err(unauthorized("Missing webhook credentials."));
            };
            match auth.mode {
                WebhookAuthMode::Token => check_token(&auth, &value, gateway)?,
                WebhookAuthMode::Hmac => {
                    let data = req.extract::<web::Bytes>().await.map_err(|e| {
                        warn!("🔐️ Failed to extract request data: {e:?}");
                        Error::from(ServerError::InvalidRequestBody("Failed to extract request data.".into()))
                    })?;
                    if !signature_matches(auth.secret.reveal(), data.as_ref(), &value) {
                        warn!("🔐️ Invalid HMAC signature in {gateway} webhook request. Denying access.");
                        return Err(unauthorized("Invalid webhook signature."));
                    }
                    req.set_payload(bytes_to_payload(data));
                },
                WebhookAuthMode::None => {},
            }
            trace!("🔐️ {gateway} webhook credentials ✅️");
            service.call(req).await
        })
    }
}

fn check_token(auth: &WebhookAuth, value: &str, gateway: PaymentGateway) -> Result<(), Error> {
    if constant_time_eq(auth.secret.reveal(), value.trim()) {
        Ok(())
    } else {
        warn!("🔐️ Invalid token in {gateway} webhook request. Denying access.");
        Err(unauthorized("Invalid webhook token."))
    }
}

fn gateway_for_path(path: &str) -> Option<PaymentGateway> {
    let segment = path.trim_end_matches('/').rsplit('/').next()?;
    GATEWAYS.into_iter().find(|g| g.as_str().eq_ignore_ascii_case(segment))
}

fn unauthorized(msg: &str) -> Error {
    ServerError::Unauthorized(msg.to_string()).into()
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
