use std::time::Duration;

use actix_cors::Cors;
use actix_web::{
    dev::Server,
    error::InternalError,
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpResponse,
    HttpServer,
};
use log::*;
use notification_tools::NotificationApi;
use spice_payment_engine::{
    events::EventHandlers,
    ConfirmationApi,
    ReconciliationApi,
    SqliteDatabase,
    VerificationApi,
    VerificationChain,
};

use crate::{
    config::ServerConfig,
    data_objects::JsonResponse,
    errors::ServerError,
    integrations::notifications::{create_notification_handlers, NOTIFICATION_EVENT_BUFFER_SIZE},
    middleware::{AdminApiKey, WebhookAuthMiddlewareFactory},
    routes::{
        health,
        AsaasWebhookRoute,
        ConfirmOrderRoute,
        GetOrderRoute,
        InfinitepayWebhookRoute,
        PagseguroWebhookRoute,
        ProcessBankStatementCsvRoute,
        ProcessBankStatementRoute,
        VerifyPendingPaymentsRoute,
    },
    verification_worker::start_verification_worker,
};

const MAX_DB_CONNECTIONS: u32 = 25;
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(10);

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::create_if_missing(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;

    let notifications =
        NotificationApi::new(config.notifications.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(NOTIFICATION_EVENT_BUFFER_SIZE, create_notification_handlers(notifications));
    let producers = handlers.producers();
    let mut handler_tasks = handlers.start_handlers();

    let confirmations = ConfirmationApi::new(db, producers);
    let verifications = VerificationApi::new(confirmations.clone(), VerificationChain::with_default_verifiers())
        .with_stale_threshold(config.stale_order_threshold);
    info!("🚀️ Verification chain: {:?}", verifications.chain());
    let worker = config.verification_interval.map(|period| start_verification_worker(verifications.clone(), period));

    let srv = create_server_instance(config, confirmations, verifications)?;
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));

    if let Some(worker) = worker {
        worker.abort();
    }
    info!("🚀️ Waiting for queued notifications to be sent");
    let drain = async { while handler_tasks.join_next().await.is_some() {} };
    if tokio::time::timeout(SHUTDOWN_GRACE_PERIOD, drain).await.is_err() {
        warn!("🚀️ Some notifications were still queued at shutdown and have been dropped");
    }
    result
}

pub fn create_server_instance(
    config: ServerConfig,
    confirmations: ConfirmationApi<SqliteDatabase>,
    verifications: VerificationApi<SqliteDatabase>,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let reconciliations = ReconciliationApi::new(confirmations.clone(), config.matching_rules.clone());
        let webhook_scope = web::scope("/webhook")
            .app_data(webhook_json_config())
            .wrap(WebhookAuthMiddlewareFactory::new(config.webhooks.clone()))
            .service(InfinitepayWebhookRoute::<SqliteDatabase>::new())
            .service(PagseguroWebhookRoute::<SqliteDatabase>::new())
            .service(AsaasWebhookRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("spg::access_log"))
            .wrap(Cors::permissive())
            .app_data(json_config())
            .app_data(web::Data::new(AdminApiKey(config.admin_api_key.clone())))
            .app_data(web::Data::new(confirmations.clone()))
            .app_data(web::Data::new(verifications.clone()))
            .app_data(web::Data::new(reconciliations))
            .service(health)
            .service(VerifyPendingPaymentsRoute::<SqliteDatabase>::new())
            .service(ProcessBankStatementRoute::<SqliteDatabase>::new())
            .service(ProcessBankStatementCsvRoute::<SqliteDatabase>::new())
            .service(GetOrderRoute::<SqliteDatabase>::new())
            .service(ConfirmOrderRoute::<SqliteDatabase>::new())
            .service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}

/// Malformed JSON bodies are answered in the same `{success: false, error}` shape as every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        warn!("💻️ Rejected request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}

/// Gateways keep redelivering anything that is not answered with a 2xx. A webhook body that cannot be parsed will never
/// succeed, so it is acknowledged with `success: false` instead.
pub fn webhook_json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, req| {
        warn!("🪝️ Unreadable webhook payload on {}. {err}", req.path());
        let response = HttpResponse::Ok().json(JsonResponse::failure(format!("Invalid webhook payload. {err}")));
        InternalError::from_response(err, response).into()
    })
}
