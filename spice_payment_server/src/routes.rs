//! Request handler definitions
//!
//! Define each route and its handler here. The real work happens in the engine APIs (`ConfirmationApi`,
//! `VerificationApi` and `ReconciliationApi`); handlers only extract the request, call through and shape the response.
//!
//! Handlers are generic over the [`OrderStore`] backend so that the endpoint tests can run them against mocks.
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Database access, outbound HTTP and anything else that waits on I/O
//! must be awaited, never blocked on.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use serde::de::DeserializeOwned;
use spice_payment_engine::{
    db_types::{OrderNsu, PaymentConfirmation},
    ConfirmationApi,
    ConfirmationOutcome,
    GatewayPaymentEvent,
    NoOpReason,
    OrderStore,
    ReconciliationApi,
    VerificationApi,
    WebhookOutcome,
};

use crate::{
    data_objects::{
        BankStatementRequest,
        CsvStatementParams,
        JsonResponse,
        ManualConfirmationRequest,
        ReconciliationResponse,
        VerificationResponse,
    },
    errors::ServerError,
    integrations::gateways::{AsaasWebhook, GatewayPayloadError, InfinitePayWebhook, PagSeguroWebhook},
};

pub const MANUAL_CONFIRMATION_SOURCE: &str = "manual";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires admin_key) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AdminKeyMiddlewareFactory::new());
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Verification  ----------------------------------------------------
route!(verify_pending_payments => Post "/verify-pending-payments" impl OrderStore where requires admin_key);
/// Runs one sweep of the periodic verifier over every pending order.
///
/// Individual order failures are reported in the results. The call only fails (with a 500) if the pending orders
/// cannot be listed at all.
pub async fn verify_pending_payments<B: OrderStore>(
    api: web::Data<VerificationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST verify pending payments");
    let summary = api.verify_pending_payments().await?;
    Ok(HttpResponse::Ok().json(VerificationResponse::from(summary)))
}

//----------------------------------------------   Bank statements  ----------------------------------------------------
route!(process_bank_statement => Post "/process-bank-statement" impl OrderStore where requires admin_key);
/// Matches the transactions of a bank statement against the pending orders.
///
/// With `autoConfirm` set, every match that reaches the confidence threshold is confirmed with the
/// `bank_statement` mode. Otherwise the matches are only reported.
pub async fn process_bank_statement<B: OrderStore>(
    body: web::Json<BankStatementRequest>,
    api: web::Data<ReconciliationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let BankStatementRequest { transactions, auto_confirm } = body.into_inner();
    debug!("💻️ POST bank statement with {} transactions. Auto-confirm: {auto_confirm}", transactions.len());
    let summary = api.process_bank_statement(transactions, auto_confirm).await?;
    Ok(HttpResponse::Ok().json(ReconciliationResponse::from(summary)))
}

route!(process_bank_statement_csv => Post "/process-bank-statement/csv" impl OrderStore where requires admin_key);
/// As [`process_bank_statement`], but the statement is posted as a CSV export
/// (`date,amount,description,type,reference`).
pub async fn process_bank_statement_csv<B: OrderStore>(
    query: web::Query<CsvStatementParams>,
    body: String,
    api: web::Data<ReconciliationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let auto_confirm = query.auto_confirm;
    debug!("💻️ POST CSV bank statement ({} bytes). Auto-confirm: {auto_confirm}", body.len());
    let summary = api.process_csv_statement(&body, auto_confirm).await?;
    Ok(HttpResponse::Ok().json(ReconciliationResponse::from(summary)))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(get_order => Get "/orders/{order_nsu}" impl OrderStore where requires admin_key);
pub async fn get_order<B: OrderStore>(
    path: web::Path<String>,
    api: web::Data<ConfirmationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_nsu = OrderNsu::from(path.into_inner());
    debug!("💻️ GET order {order_nsu}");
    let order = api
        .db()
        .fetch_order_by_nsu(&order_nsu)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_nsu} does not exist")))?;
    Ok(HttpResponse::Ok().json(order))
}

route!(confirm_order => Post "/orders/{order_nsu}/confirm" impl OrderStore where requires admin_key);
/// Confirms an order by hand, e.g. after an operator has seen the payment in the bank app.
///
/// The body is optional. The amount defaults to the order total and the source to `manual`.
pub async fn confirm_order<B: OrderStore>(
    path: web::Path<String>,
    body: Option<web::Json<ManualConfirmationRequest>>,
    api: web::Data<ConfirmationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_nsu = OrderNsu::from(path.into_inner());
    let request = body.map(|b| b.into_inner()).unwrap_or_default();
    debug!("💻️ POST manual confirmation for order {order_nsu}");
    let order = api
        .db()
        .fetch_order_by_nsu(&order_nsu)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_nsu} does not exist")))?;
    let amount = request.amount.unwrap_or(order.total_amount);
    let source = request.source.filter(|s| !s.trim().is_empty()).unwrap_or_else(|| MANUAL_CONFIRMATION_SOURCE.into());
    let confirmation = PaymentConfirmation::manual(amount, source).with_transaction_ref(request.transaction_ref);
    match api.confirm_payment(&order_nsu, confirmation).await? {
        ConfirmationOutcome::Confirmed(_) => {
            info!("💻️ Order {order_nsu} was confirmed manually");
            Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Order {order_nsu} confirmed."))))
        },
        ConfirmationOutcome::NoOp(NoOpReason::NotPending(status)) => {
            Ok(HttpResponse::Ok().json(JsonResponse::failure(format!("Order {order_nsu} is already {status}."))))
        },
        ConfirmationOutcome::NoOp(NoOpReason::OrderNotFound) => {
            Err(ServerError::NoRecordFound(format!("Order {order_nsu} does not exist")))
        },
    }
}

//----------------------------------------------   Webhooks  ----------------------------------------------------
// Gateways retry any delivery that is not answered with a 2xx. Payloads that can never be processed are therefore
// acknowledged with `success: false`, while store failures return a 500 so that the delivery is retried.

route!(infinitepay_webhook => Post "/infinitepay" impl OrderStore);
pub async fn infinitepay_webhook<B: OrderStore>(
    body: web::Json<InfinitePayWebhook>,
    api: web::Data<ConfirmationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    handle_gateway_webhook(body, api.get_ref()).await
}

route!(pagseguro_webhook => Post "/pagseguro" impl OrderStore);
pub async fn pagseguro_webhook<B: OrderStore>(
    body: web::Json<PagSeguroWebhook>,
    api: web::Data<ConfirmationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    handle_gateway_webhook(body, api.get_ref()).await
}

route!(asaas_webhook => Post "/asaas" impl OrderStore);
pub async fn asaas_webhook<B: OrderStore>(
    body: web::Json<AsaasWebhook>,
    api: web::Data<ConfirmationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    handle_gateway_webhook(body, api.get_ref()).await
}

async fn handle_gateway_webhook<P, B>(
    body: web::Json<P>,
    api: &ConfirmationApi<B>,
) -> Result<HttpResponse, ServerError>
where
    P: DeserializeOwned,
    GatewayPaymentEvent: TryFrom<P, Error = GatewayPayloadError>,
    B: OrderStore,
{
    let event = match GatewayPaymentEvent::try_from(body.into_inner()) {
        Ok(event) => event,
        Err(e) => {
            warn!("🪝️ {e}");
            return Ok(HttpResponse::Ok().json(JsonResponse::failure(e)));
        },
    };
    let gateway = event.gateway;
    let order_nsu = event.order_nsu.clone();
    trace!("🪝️ Received {gateway} webhook for order {order_nsu}");
    let response = match api.process_gateway_event(event).await? {
        WebhookOutcome::Ignored(event) => {
            JsonResponse::success(format!("Event acknowledged. Status '{}' requires no action.", event.status))
        },
        WebhookOutcome::Processed(ConfirmationOutcome::Confirmed(_)) => {
            JsonResponse::success(format!("Order {order_nsu} confirmed."))
        },
        WebhookOutcome::Processed(ConfirmationOutcome::NoOp(NoOpReason::NotPending(status))) => {
            debug!("🪝️ Repeated {gateway} webhook for order {order_nsu}, which is already {status}");
            JsonResponse::success(format!("Order {order_nsu} was already {status}."))
        },
        WebhookOutcome::Processed(ConfirmationOutcome::NoOp(NoOpReason::OrderNotFound)) => {
            warn!("🪝️ {gateway} reported a payment for unknown order {order_nsu}");
            JsonResponse::failure(format!("Order {order_nsu} does not exist."))
        },
    };
    Ok(HttpResponse::Ok().json(response))
}
