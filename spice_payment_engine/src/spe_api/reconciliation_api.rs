use std::fmt::Debug;

use log::*;
use thiserror::Error;

use crate::{
    db_types::{Cents, Order, PaymentConfirmation},
    helpers::{
        statement_import::{parse_statement_csv, StatementImportError},
        statement_matching::{confidence, find_amount_mismatch, find_candidate},
    },
    spe_api::{
        confirmation_api::{ConfirmationApi, ConfirmationOutcome},
        reconciliation_objects::{
            BankTransaction,
            MatchingRules,
            ReconciliationResult,
            ReconciliationStatus,
            ReconciliationSummary,
        },
    },
    traits::{OrderStore, OrderStoreError},
};

/// The `confirmation_source` recorded for orders confirmed from a bank statement.
pub const BANK_STATEMENT_SOURCE: &str = "extrato_bancario";

#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("The bank statement contains no transactions")]
    NoTransactions,
    #[error("{0}")]
    StatementImport(#[from] StatementImportError),
    #[error("{0}")]
    Store(#[from] OrderStoreError),
}

/// Matches pending orders against bank statement lines, and optionally confirms the confident matches.
pub struct ReconciliationApi<B> {
    confirmations: ConfirmationApi<B>,
    rules: MatchingRules,
}

impl<B> Debug for ReconciliationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi({:?})", self.rules)
    }
}

impl<B> ReconciliationApi<B> {
    pub fn new(confirmations: ConfirmationApi<B>, rules: MatchingRules) -> Self {
        Self { confirmations, rules }
    }

    pub fn rules(&self) -> &MatchingRules {
        &self.rules
    }
}

impl<B> ReconciliationApi<B>
where B: OrderStore
{
    /// Parses a CSV statement and reconciles it. See [`Self::process_bank_statement`].
    pub async fn process_csv_statement(
        &self,
        csv: &str,
        auto_confirm: bool,
    ) -> Result<ReconciliationSummary, ReconciliationError> {
        let transactions = parse_statement_csv(csv)?;
        self.process_bank_statement(transactions, auto_confirm).await
    }

    /// Runs one reconciliation pass over the statement.
    ///
    /// Each pending order (newest first) takes the first unused transaction that matches it, and that transaction is
    /// then no longer available to other orders. Matching is greedy, so when several orders share the same total the
    /// newest order gets the first suitable transaction.
    pub async fn process_bank_statement(
        &self,
        transactions: Vec<BankTransaction>,
        auto_confirm: bool,
    ) -> Result<ReconciliationSummary, ReconciliationError> {
        if transactions.is_empty() {
            warn!("🏦️ Rejecting an empty bank statement");
            return Err(ReconciliationError::NoTransactions);
        }
        let transactions_processed = transactions.len();
        let credits = transactions.into_iter().filter(BankTransaction::is_candidate).collect::<Vec<_>>();
        let pending = self.confirmations.db().fetch_pending_orders().await?;
        if pending.is_empty() {
            info!("🏦️ No pending orders. Nothing to reconcile against {transactions_processed} transactions");
            return Ok(ReconciliationSummary {
                transactions_processed,
                message: Some("No pending orders: nothing to reconcile".to_string()),
                ..Default::default()
            });
        }
        debug!(
            "🏦️ Reconciling {} pending orders against {} of {transactions_processed} transactions",
            pending.len(),
            credits.len()
        );
        let mut pool = credits.clone();
        let mut results = Vec::with_capacity(pending.len());
        for order in &pending {
            let result = match find_candidate(&pool, order, &self.rules) {
                Some(index) => {
                    let tx = pool.remove(index);
                    self.handle_match(order, tx, auto_confirm).await
                },
                None => self.unmatched_result(order, &credits),
            };
            results.push(result);
        }
        let matched = results.iter().filter(|r| r.status == ReconciliationStatus::Matched).count();
        let confirmed = results.iter().filter(|r| r.confirmed).count();
        let errors = results.iter().filter(|r| r.status == ReconciliationStatus::Error).count();
        info!(
            "🏦️ Bank statement processed. {matched} of {} orders matched, {confirmed} confirmed, {errors} errors",
            pending.len()
        );
        Ok(ReconciliationSummary {
            transactions_processed,
            orders_checked: pending.len(),
            matched,
            confirmed,
            errors,
            message: None,
            results,
        })
    }

    /// Scores a match and confirms it when allowed. A failed confirmation is recorded on the result and never
    /// stops the rest of the statement from being processed.
    async fn handle_match(&self, order: &Order, tx: BankTransaction, auto_confirm: bool) -> ReconciliationResult {
        let score = confidence(&tx, order, &self.rules);
        debug!("🏦️ Order {} matched '{}' ({}) with confidence {score}", order.order_nsu, tx.description, tx.amount);
        let mut result = ReconciliationResult {
            order_nsu: order.order_nsu.clone(),
            order_amount: order.total_amount.to_major(),
            matched_transaction: None,
            status: ReconciliationStatus::Matched,
            confidence: score,
            confirmed: false,
            message: None,
        };
        if auto_confirm && score >= self.rules.min_confidence {
            match self.confirm_match(order, &tx).await {
                Ok(confirmed) => result.confirmed = confirmed,
                Err(e) => {
                    error!("🏦️ Could not confirm order {} from the bank statement. {e}", order.order_nsu);
                    result.status = ReconciliationStatus::Error;
                    result.message = Some(e);
                },
            }
        } else if auto_confirm {
            info!(
                "🏦️ Match for order {} scored {score}, below the auto-confirm threshold of {}",
                order.order_nsu, self.rules.min_confidence
            );
        }
        result.matched_transaction = Some(tx);
        result
    }

    async fn confirm_match(&self, order: &Order, tx: &BankTransaction) -> Result<bool, String> {
        let amount = Cents::try_from_major(tx.amount).map_err(|e| format!("Transaction amount is unusable: {e}"))?;
        let confirmation =
            PaymentConfirmation::bank_statement(amount, BANK_STATEMENT_SOURCE).with_transaction_ref(tx.reference.clone());
        let outcome =
            self.confirmations.confirm_payment(&order.order_nsu, confirmation).await.map_err(|e| e.to_string())?;
        Ok(matches!(outcome, ConfirmationOutcome::Confirmed(_)))
    }

    fn unmatched_result(&self, order: &Order, credits: &[BankTransaction]) -> ReconciliationResult {
        let (status, matched_transaction) = match find_amount_mismatch(credits, order, &self.rules) {
            Some(tx) => {
                warn!(
                    "🏦️ A transaction of {} mentions order {} but the order total is {}",
                    tx.amount, order.order_nsu, order.total_amount
                );
                (ReconciliationStatus::AmountMismatch, Some(tx.clone()))
            },
            None => {
                trace!("🏦️ No transaction found for order {}", order.order_nsu);
                (ReconciliationStatus::NotFound, None)
            },
        };
        ReconciliationResult {
            order_nsu: order.order_nsu.clone(),
            order_amount: order.total_amount.to_major(),
            matched_transaction,
            status,
            confidence: 0,
            confirmed: false,
            message: None,
        }
    }
}
