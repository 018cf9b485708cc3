use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use spice_payment_engine::{
    db_types::{ConfirmationMode, OrderStatusType},
    test_utils::verifiers::{Answer, ScriptedVerifier},
    OrderStoreError,
    VerificationApi,
    VerificationChain,
};

use super::{
    helpers::{confirmation_api, is_confirmation, paid, pending_order, send_request},
    mocks::MockStore,
};
use crate::routes::VerifyPendingPaymentsRoute;

fn configure(store: MockStore, chain: VerificationChain) -> impl FnOnce(&mut ServiceConfig) {
    let api = VerificationApi::new(confirmation_api(store), chain);
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(api)).service(VerifyPendingPaymentsRoute::<MockStore>::new());
    }
}

#[actix_web::test]
async fn nothing_pending() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_fetch_pending_orders().times(1).returning(|| Ok(vec![]));
    store.expect_confirm_if_pending().never();
    let req = TestRequest::post().uri("/verify-pending-payments");
    let (status, body) = send_request(req, configure(store, VerificationChain::with_default_verifiers())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["verified"], 0);
    assert_eq!(body["confirmed"], 0);
    assert_eq!(body["results"], serde_json::json!([]));
    assert!(body["timestamp"].is_string());
}

#[actix_web::test]
async fn store_unavailable() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_fetch_pending_orders().returning(|| Err(OrderStoreError::DatabaseError("database is locked".into())));
    let req = TestRequest::post().uri("/verify-pending-payments");
    let (status, body) = send_request(req, configure(store, VerificationChain::with_default_verifiers())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "An error occurred on the backend of the server. Database error: database is locked");
}

#[actix_web::test]
async fn sweep_confirms_verified_orders() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store
        .expect_fetch_pending_orders()
        .times(1)
        .returning(|| Ok(vec![pending_order("ORD1", 9990), pending_order("ORD2", 4500)]));
    store
        .expect_confirm_if_pending()
        .withf(|nsu, c| nsu.as_str() == "ORD1" && is_confirmation(c, ConfirmationMode::Periodic, "bank_api", 9990))
        .times(1)
        .returning(|_, c| Ok(Some(paid(pending_order("ORD1", 9990), c))));
    let mut chain = VerificationChain::with_default_verifiers();
    chain.register(5, ScriptedVerifier::new("bank_api", Answer::Unpaid).answer("ORD1", Answer::Paid));
    let req = TestRequest::post().uri("/verify-pending-payments");
    let (status, body) = send_request(req, configure(store, chain)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verified"], 2);
    assert_eq!(body["confirmed"], 1);
    assert_eq!(body["still_pending"], 1);
    assert_eq!(body["errors"], 0);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["order_nsu"], "ORD1");
    assert_eq!(results[0]["status"], "confirmed");
    assert_eq!(results[0]["source"], "bank_api");
    assert_eq!(results[1]["order_nsu"], "ORD2");
    assert_eq!(results[1]["status"], "still_pending");
    // The test orders were placed long ago, so they are flagged as stale
    assert!(results[1]["message"].as_str().unwrap().starts_with("Pending for"));
}

#[actix_web::test]
async fn failing_verifiers_are_reported_per_order() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_fetch_pending_orders().returning(|| Ok(vec![pending_order("ORD1", 9990)]));
    store.expect_confirm_if_pending().never();
    let mut chain = VerificationChain::default();
    chain.register(1, ScriptedVerifier::new("bank_api", Answer::Fail));
    let req = TestRequest::post().uri("/verify-pending-payments");
    let (status, body) = send_request(req, configure(store, chain)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["errors"], 1);
    assert_eq!(body["results"][0]["status"], "error");
    assert_eq!(body["results"][0]["message"], "bank_api: The payment status source is unavailable: bank_api is down");
}

fn order_taken_elsewhere(status: OrderStatusType) -> MockStore {
    let mut store = MockStore::new();
    store.expect_fetch_pending_orders().times(1).returning(|| Ok(vec![pending_order("ORD1", 9990)]));
    store.expect_confirm_if_pending().times(1).returning(|_, _| Ok(None));
    store.expect_fetch_order_by_nsu().times(1).returning(move |_| {
        let mut order = pending_order("ORD1", 9990);
        order.status = status;
        Ok(Some(order))
    });
    store
}

fn paying_chain() -> VerificationChain {
    let mut chain = VerificationChain::default();
    chain.register(1, ScriptedVerifier::new("bank_api", Answer::Paid));
    chain
}

#[actix_web::test]
async fn order_shipped_before_the_sweep_wrote() {
    let _ = env_logger::try_init();
    let store = order_taken_elsewhere(OrderStatusType::Shipped);
    let req = TestRequest::post().uri("/verify-pending-payments");
    let (status, body) = send_request(req, configure(store, paying_chain())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["confirmed"], 1);
    assert_eq!(body["results"][0]["status"], "confirmed");
    assert_eq!(body["results"][0]["message"], "Already confirmed by another source");
}

#[actix_web::test]
async fn order_cancelled_before_the_sweep_wrote() {
    let _ = env_logger::try_init();
    let store = order_taken_elsewhere(OrderStatusType::Cancelled);
    let req = TestRequest::post().uri("/verify-pending-payments");
    let (status, body) = send_request(req, configure(store, paying_chain())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["confirmed"], 0);
    assert_eq!(body["errors"], 1);
    assert_eq!(body["results"][0]["status"], "error");
    assert_eq!(body["results"][0]["source"], "bank_api");
    assert_eq!(body["results"][0]["message"], "Payment found, but the order is cancelled");
}
