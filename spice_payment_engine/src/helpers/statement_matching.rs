//! # Bank statement matching
//!
//! Pure functions that decide whether a bank statement line could be the payment for a pending order, and how much
//! we trust that match.
//!
//! A transaction is a *candidate* for an order when
//! * it is a credit with a positive amount,
//! * its amount differs from the order total by strictly less than [`MatchingRules::tolerance`], and
//! * it was booked on or after the moment the order was created.
//!
//! Candidates are scored starting from [`MatchingRules::base_confidence`], with boosts when the description mentions
//! PIX, the order NSU or the customer's name. Text comparisons ignore case.
use rust_decimal::Decimal;

use crate::{
    db_types::{Cents, Order},
    spe_api::reconciliation_objects::{BankTransaction, MatchingRules},
};

pub fn amount_matches(amount: Decimal, total: Cents, tolerance: Decimal) -> bool {
    (amount - total.to_major()).abs() < tolerance
}

pub fn is_candidate_for(tx: &BankTransaction, order: &Order, rules: &MatchingRules) -> bool {
    tx.is_candidate()
        && amount_matches(tx.amount, order.total_amount, rules.tolerance)
        && tx.date.is_on_or_after(order.created_at)
}

fn mentions(description: &str, needle: &str) -> bool {
    let needle = needle.trim();
    !needle.is_empty() && description.contains(&needle.to_lowercase())
}

fn mentions_nsu(tx: &BankTransaction, order: &Order) -> bool {
    mentions(&tx.description.to_lowercase(), order.order_nsu.as_str())
}

/// Scores a candidate match between 0 and 100.
pub fn confidence(tx: &BankTransaction, order: &Order, rules: &MatchingRules) -> u8 {
    let description = tx.description.to_lowercase();
    let mut score = u32::from(rules.base_confidence);
    if description.contains("pix") {
        score += u32::from(rules.pix_boost);
    }
    if mentions(&description, order.order_nsu.as_str()) {
        score += u32::from(rules.nsu_boost);
    }
    if order.customer_name.as_deref().is_some_and(|name| mentions(&description, name)) {
        score += u32::from(rules.customer_name_boost);
    }
    // min() bounds the value to 100, so the cast cannot truncate
    score.min(100) as u8
}

/// The index of the first transaction in the pool that is a candidate for `order`.
pub fn find_candidate(pool: &[BankTransaction], order: &Order, rules: &MatchingRules) -> Option<usize> {
    pool.iter().position(|tx| is_candidate_for(tx, order, rules))
}

/// Looks for a credit that names the order in its description and was booked after the order, but whose amount is
/// outside the tolerance. Such a line is most likely a partial or mistaken payment for this order.
pub fn find_amount_mismatch<'a>(
    transactions: &'a [BankTransaction],
    order: &Order,
    rules: &MatchingRules,
) -> Option<&'a BankTransaction> {
    transactions.iter().find(|tx| {
        tx.is_candidate()
            && tx.date.is_on_or_after(order.created_at)
            && mentions_nsu(tx, order)
            && !amount_matches(tx.amount, order.total_amount, rules.tolerance)
    })
}
