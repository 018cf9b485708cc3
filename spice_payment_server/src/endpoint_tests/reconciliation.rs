use actix_web::{
    http::{header::ContentType, StatusCode},
    test::TestRequest,
    web,
    web::ServiceConfig,
};
use serde_json::json;
use spice_payment_engine::{db_types::ConfirmationMode, MatchingRules, ReconciliationApi};

use super::{
    helpers::{confirmation_api, is_confirmation, paid, pending_order, send_request},
    mocks::MockStore,
};
use crate::routes::{ProcessBankStatementCsvRoute, ProcessBankStatementRoute};

fn configure(store: MockStore) -> impl FnOnce(&mut ServiceConfig) {
    let api = ReconciliationApi::new(confirmation_api(store), MatchingRules::default());
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(api))
            .service(ProcessBankStatementRoute::<MockStore>::new())
            .service(ProcessBankStatementCsvRoute::<MockStore>::new());
    }
}

fn statement(auto_confirm: bool) -> serde_json::Value {
    json!({
        "autoConfirm": auto_confirm,
        "transactions": [
            { "date": "2024-10-17", "amount": 15.00, "description": "TARIFA PACOTE SERVICOS", "type": "debit" },
            { "date": "2024-10-17", "amount": 99.90, "description": "PIX RECEBIDO ORD1 Maria Souza", "type": "credit" },
            { "date": "2024-10-18", "amount": 45.00, "description": "TED RECEBIDA", "type": "credit" }
        ]
    })
}

#[actix_web::test]
async fn empty_statement() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_fetch_pending_orders().never();
    let req = TestRequest::post().uri("/process-bank-statement").set_json(json!({ "transactions": [] }));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Could not read request body: The bank statement contains no transactions");
}

#[actix_web::test]
async fn malformed_statement() {
    let _ = env_logger::try_init();
    let store = MockStore::new();
    let req = TestRequest::post().uri("/process-bank-statement").set_json(json!({ "autoConfirm": true }));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn no_pending_orders() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_fetch_pending_orders().times(1).returning(|| Ok(vec![]));
    let req = TestRequest::post().uri("/process-bank-statement").set_json(statement(true));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["transactions_processed"], 3);
    assert_eq!(body["matched"], 0);
    assert_eq!(body["message"], "No pending orders: nothing to reconcile");
}

#[actix_web::test]
async fn statement_confirms_matching_order() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store
        .expect_fetch_pending_orders()
        .times(1)
        .returning(|| Ok(vec![pending_order("ORD1", 9990), pending_order("ORD2", 12000)]));
    store
        .expect_confirm_if_pending()
        .withf(|nsu, c| {
            nsu.as_str() == "ORD1" && is_confirmation(c, ConfirmationMode::BankStatement, "extrato_bancario", 9990)
        })
        .times(1)
        .returning(|_, c| Ok(Some(paid(pending_order("ORD1", 9990), c))));
    let req = TestRequest::post().uri("/process-bank-statement").set_json(statement(true));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transactions_processed"], 3);
    assert_eq!(body["orders_checked"], 2);
    assert_eq!(body["matched"], 1);
    assert_eq!(body["confirmed"], 1);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["order_nsu"], "ORD1");
    assert_eq!(results[0]["status"], "matched");
    assert_eq!(results[0]["confidence"], 100);
    assert_eq!(results[0]["confirmed"], true);
    assert_eq!(results[0]["matched_transaction"]["description"], "PIX RECEBIDO ORD1 Maria Souza");
    assert_eq!(results[1]["order_nsu"], "ORD2");
    assert_eq!(results[1]["status"], "not_found");
    assert_eq!(results[1]["confidence"], 0);
    assert!(results[1]["matched_transaction"].is_null());
}

#[actix_web::test]
async fn statement_without_auto_confirm_only_reports() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_fetch_pending_orders().returning(|| Ok(vec![pending_order("ORD1", 9990)]));
    store.expect_confirm_if_pending().never();
    let req = TestRequest::post().uri("/process-bank-statement").set_json(statement(false));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched"], 1);
    assert_eq!(body["confirmed"], 0);
    assert_eq!(body["results"][0]["confirmed"], false);
}

#[actix_web::test]
async fn csv_statement() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_fetch_pending_orders().times(1).returning(|| Ok(vec![pending_order("ORD1", 9990)]));
    store
        .expect_confirm_if_pending()
        .withf(|_, c| {
            is_confirmation(c, ConfirmationMode::BankStatement, "extrato_bancario", 9990) &&
                c.transaction_ref.as_deref() == Some("E18236120202410171430")
        })
        .times(1)
        .returning(|_, c| Ok(Some(paid(pending_order("ORD1", 9990), c))));
    let csv = "date;amount;description;type;reference\n\
               17/10/2024;-15,00;TARIFA PACOTE SERVICOS;;\n\
               17/10/2024;99,90;PIX RECEBIDO ORD1;credito;E18236120202410171430\n";
    let req = TestRequest::post()
        .uri("/process-bank-statement/csv?autoConfirm=true")
        .insert_header(ContentType::plaintext())
        .set_payload(csv);
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transactions_processed"], 2);
    assert_eq!(body["matched"], 1);
    assert_eq!(body["confirmed"], 1);
}

#[actix_web::test]
async fn csv_statement_with_bad_row() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_fetch_pending_orders().never();
    let csv = "date,amount,description,type\n2024-10-17,lots,PIX RECEBIDO ORD1,credit\n";
    let req = TestRequest::post().uri("/process-bank-statement/csv").set_payload(csv);
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Line 2"));
}
