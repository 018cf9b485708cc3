use std::str::FromStr;

use chrono::{DateTime, Utc};
use cucumber::{given, then, when};
use rust_decimal::Decimal;
use spice_payment_engine::{
    db_types::{Cents, ConfirmationMode, NewOrder, OrderNsu, OrderStatusType, PaymentMethod},
    BankTransaction,
    OrderStore,
    ReconciliationStatus,
    StatementDate,
    TransactionType,
};

use crate::cucumber::SpiceWorld;

#[given(expr = "a PIX order {word} for {int} cents from {string} placed at {word}")]
async fn pix_order(world: &mut SpiceWorld, nsu: String, cents: i64, customer: String, placed_at: String) {
    let created_at = DateTime::parse_from_rfc3339(&placed_at).expect("Invalid timestamp").with_timezone(&Utc);
    let order = NewOrder::new(nsu, Cents::from(cents))
        .with_customer(&customer, None, None)
        .with_payment_method(PaymentMethod::Pix)
        .created_at(created_at);
    world.system().db.insert_order(order).await.expect("Error inserting order");
}

#[given(expr = "the statement has a {word} of {word} on {word} described as {string}")]
async fn statement_line(world: &mut SpiceWorld, kind: String, amount: String, date: String, description: String) {
    let transaction_type = match kind.as_str() {
        "credit" => TransactionType::Credit,
        "debit" => TransactionType::Debit,
        other => panic!("Unknown transaction type {other}"),
    };
    let tx = BankTransaction {
        date: StatementDate::from_str(&date).expect("Invalid statement date"),
        amount: Decimal::from_str(&amount).expect("Invalid amount"),
        description,
        transaction_type,
        reference: None,
    };
    world.statement.push(tx);
}

#[when(expr = "the statement is reconciled with auto-confirm {word}")]
async fn reconcile(world: &mut SpiceWorld, auto_confirm: String) {
    let auto_confirm = auto_confirm == "on";
    let statement = std::mem::take(&mut world.statement);
    let summary =
        world.system().api.process_bank_statement(statement, auto_confirm).await.expect("Error reconciling statement");
    world.last_summary = Some(summary);
}

#[then(expr = "{int} of {int} orders are matched and {int} confirmed")]
async fn check_totals(world: &mut SpiceWorld, matched: usize, checked: usize, confirmed: usize) {
    let summary = world.summary();
    assert_eq!(summary.matched, matched, "matched");
    assert_eq!(summary.orders_checked, checked, "orders checked");
    assert_eq!(summary.confirmed, confirmed, "confirmed");
}

#[then(expr = "order {word} is reported as {word} with confidence {int}")]
async fn check_result(world: &mut SpiceWorld, nsu: String, status: String, confidence: u8) {
    let status = match status.as_str() {
        "matched" => ReconciliationStatus::Matched,
        "not_found" => ReconciliationStatus::NotFound,
        "amount_mismatch" => ReconciliationStatus::AmountMismatch,
        other => panic!("Unknown reconciliation status {other}"),
    };
    let result = world
        .summary()
        .results
        .iter()
        .find(|r| r.order_nsu.as_str() == nsu)
        .unwrap_or_else(|| panic!("No result for order {nsu}"));
    assert_eq!(result.status, status);
    assert_eq!(result.confidence, confidence);
}

#[then(expr = "order {word} has status {word}")]
async fn check_status(world: &mut SpiceWorld, nsu: String, status: String) {
    let expected = OrderStatusType::from_str(&status).expect("Unknown order status");
    let order =
        world.system().db.fetch_order_by_nsu(&OrderNsu::from(nsu)).await.expect("Error fetching order").expect("No order");
    assert_eq!(order.status, expected);
    if expected == OrderStatusType::Paid {
        assert_eq!(order.confirmation_mode, Some(ConfirmationMode::BankStatement));
    }
}

#[then(expr = "the reconciliation message says {string}")]
async fn check_message(world: &mut SpiceWorld, message: String) {
    let actual = world.summary().message.clone().unwrap_or_default();
    assert!(actual.contains(&message), "'{actual}' does not mention '{message}'");
}
