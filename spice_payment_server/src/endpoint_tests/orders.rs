use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use spg_common::Secret;
use spice_payment_engine::{
    db_types::{ConfirmationMode, OrderStatusType},
    OrderStoreError,
};

use super::{
    helpers::{confirmation_api, is_confirmation, paid, pending_order, send_request},
    mocks::MockStore,
};
use crate::{
    middleware::{AdminApiKey, ADMIN_KEY_HEADER},
    routes::{ConfirmOrderRoute, GetOrderRoute},
};

fn configure(store: MockStore, admin_key: &str) -> impl FnOnce(&mut ServiceConfig) {
    let api = confirmation_api(store);
    let key = AdminApiKey(Secret::new(admin_key.to_string()));
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(api))
            .app_data(web::Data::new(key))
            .service(GetOrderRoute::<MockStore>::new())
            .service(ConfirmOrderRoute::<MockStore>::new());
    }
}

#[actix_web::test]
async fn fetch_order() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store
        .expect_fetch_order_by_nsu()
        .withf(|nsu| nsu.as_str() == "ORD1")
        .returning(|_| Ok(Some(pending_order("ORD1", 9990))));
    let req = TestRequest::get().uri("/orders/ORD1");
    let (status, body) = send_request(req, configure(store, "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order_nsu"], "ORD1");
    assert_eq!(body["total_amount"], 9990);
    assert_eq!(body["status"], "pending_pix");
}

#[actix_web::test]
async fn fetch_unknown_order() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_fetch_order_by_nsu().returning(|_| Ok(None));
    let req = TestRequest::get().uri("/orders/ORD404");
    let (status, body) = send_request(req, configure(store, "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "The data was not found. Order ORD404 does not exist");
}

#[actix_web::test]
async fn fetch_order_database_down() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_fetch_order_by_nsu().returning(|_| Err(OrderStoreError::DatabaseError("disk I/O error".into())));
    let req = TestRequest::get().uri("/orders/ORD1");
    let (status, body) = send_request(req, configure(store, "")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn manual_confirmation_defaults_to_order_total() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_fetch_order_by_nsu().times(1).returning(|_| Ok(Some(pending_order("ORD1", 9990))));
    store
        .expect_confirm_if_pending()
        .withf(|nsu, c| nsu.as_str() == "ORD1" && is_confirmation(c, ConfirmationMode::Manual, "manual", 9990))
        .times(1)
        .returning(|_, c| Ok(Some(paid(pending_order("ORD1", 9990), c))));
    let req = TestRequest::post().uri("/orders/ORD1/confirm");
    let (status, body) = send_request(req, configure(store, "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Order ORD1 confirmed.");
}

#[actix_web::test]
async fn manual_confirmation_with_details() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_fetch_order_by_nsu().returning(|_| Ok(Some(pending_order("ORD1", 9990))));
    store
        .expect_confirm_if_pending()
        .withf(|_, c| {
            is_confirmation(c, ConfirmationMode::Manual, "admin:joana", 9989) &&
                c.transaction_ref.as_deref() == Some("E0000000020241017")
        })
        .times(1)
        .returning(|_, c| Ok(Some(paid(pending_order("ORD1", 9990), c))));
    let req = TestRequest::post().uri("/orders/ORD1/confirm").set_json(serde_json::json!({
        "amount": 9989,
        "source": "admin:joana",
        "transaction_ref": "E0000000020241017"
    }));
    let (status, body) = send_request(req, configure(store, "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[actix_web::test]
async fn manual_confirmation_of_paid_order() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_fetch_order_by_nsu().times(2).returning(|_| {
        let mut order = pending_order("ORD1", 9990);
        order.status = OrderStatusType::Paid;
        Ok(Some(order))
    });
    store.expect_confirm_if_pending().times(1).returning(|_, _| Ok(None));
    let req = TestRequest::post().uri("/orders/ORD1/confirm");
    let (status, body) = send_request(req, configure(store, "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Order ORD1 is already paid.");
}

#[actix_web::test]
async fn manual_confirmation_of_unknown_order() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_fetch_order_by_nsu().returning(|_| Ok(None));
    store.expect_confirm_if_pending().never();
    let req = TestRequest::post().uri("/orders/ORD404/confirm");
    let (status, _) = send_request(req, configure(store, "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn admin_routes_require_the_api_key() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_fetch_order_by_nsu().never();
    let req = TestRequest::get().uri("/orders/ORD1");
    let (status, body) = send_request(req, configure(store, "k3y")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let mut store = MockStore::new();
    store.expect_fetch_order_by_nsu().never();
    let req = TestRequest::get().uri("/orders/ORD1").insert_header((ADMIN_KEY_HEADER, "wrong"));
    let (status, _) = send_request(req, configure(store, "k3y")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut store = MockStore::new();
    store.expect_fetch_order_by_nsu().times(1).returning(|_| Ok(Some(pending_order("ORD1", 9990))));
    let req = TestRequest::get().uri("/orders/ORD1").insert_header((ADMIN_KEY_HEADER, "k3y"));
    let (status, body) = send_request(req, configure(store, "k3y")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order_nsu"], "ORD1");
}
