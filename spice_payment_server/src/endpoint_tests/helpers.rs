use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use log::debug;
use spg_common::Cents;
use spice_payment_engine::{
    db_types::{ConfirmationMode, Order, OrderNsu, OrderStatusType, PaymentConfirmation, PaymentMethod},
    events::EventProducers,
    ConfirmationApi,
};

use crate::{endpoint_tests::mocks::MockStore, server::json_config};

/// Sends the request to an app set up by `configure`. Errors raised by middleware are rendered into responses, the
/// same way the server does it.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, serde_json::Value)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().app_data(json_config()).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (status, body) = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            (status, test::read_body(res).await)
        },
        Err(e) => {
            let res = e.error_response();
            (res.status(), res.into_body().try_into_bytes().unwrap())
        },
    };
    let json = if body.is_empty() { serde_json::Value::Null } else { serde_json::from_slice(&body).unwrap() };
    (status, json)
}

pub fn confirmation_api(store: MockStore) -> ConfirmationApi<MockStore> {
    ConfirmationApi::new(store, EventProducers::default())
}

pub fn pending_order(nsu: &str, total: i64) -> Order {
    let created_at = Utc.with_ymd_and_hms(2024, 10, 17, 14, 30, 0).unwrap();
    Order {
        id: 1,
        order_nsu: OrderNsu::from(nsu),
        customer_name: Some("Maria Souza".into()),
        customer_email: Some("maria@example.com".into()),
        customer_phone: Some("+5511987654321".into()),
        items: vec![],
        total_amount: Cents::from(total),
        paid_amount: None,
        payment_method: Some(PaymentMethod::Pix),
        status: OrderStatusType::PendingPix,
        confirmation_mode: None,
        confirmation_source: None,
        transaction_ref: None,
        created_at,
        updated_at: created_at,
    }
}

pub fn paid(mut order: Order, confirmation: &PaymentConfirmation) -> Order {
    order.status = OrderStatusType::Paid;
    order.paid_amount = Some(confirmation.amount);
    order.confirmation_mode = Some(confirmation.mode);
    order.confirmation_source = Some(confirmation.source.clone());
    order.transaction_ref = confirmation.transaction_ref.clone();
    if confirmation.payment_method.is_some() {
        order.payment_method = confirmation.payment_method;
    }
    order
}

pub fn is_confirmation(c: &PaymentConfirmation, mode: ConfirmationMode, source: &str, amount: i64) -> bool {
    c.mode == mode && c.source == source && c.amount == Cents::from(amount)
}
