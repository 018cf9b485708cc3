use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::*;

use crate::{
    db_types::{Order, PaymentConfirmation},
    spe_api::{
        confirmation_api::{ConfirmationApi, ConfirmationOutcome, NoOpReason},
        verification_objects::{VerificationResult, VerificationStatus, VerificationSummary},
    },
    traits::{OrderStore, OrderStoreError, PaymentVerifier, VerifierError},
};

pub const DEFAULT_STALE_ORDER_HOURS: i64 = 24;

//--------------------------------------   VerificationChain   ---------------------------------------------------------
/// An ordered list of payment verifiers. Lower priority values are consulted first; verifiers sharing a priority are
/// consulted in the order they were registered.
#[derive(Clone, Default)]
pub struct VerificationChain {
    verifiers: Vec<(u8, Arc<dyn PaymentVerifier>)>,
}

impl Debug for VerificationChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.verifiers.iter().map(|(p, v)| format!("{p}:{}", v.name()))).finish()
    }
}

impl VerificationChain {
    /// The chain used when nothing else is configured.
    pub fn with_default_verifiers() -> Self {
        let mut chain = Self::default();
        chain.register(GatewayStatusCheck::PRIORITY, GatewayStatusCheck);
        chain
    }

    pub fn register<V: PaymentVerifier + 'static>(&mut self, priority: u8, verifier: V) -> &mut Self {
        self.register_arc(priority, Arc::new(verifier))
    }

    pub fn register_arc(&mut self, priority: u8, verifier: Arc<dyn PaymentVerifier>) -> &mut Self {
        let index = self.verifiers.iter().position(|(p, _)| *p > priority).unwrap_or(self.verifiers.len());
        self.verifiers.insert(index, (priority, verifier));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn PaymentVerifier> {
        self.verifiers.iter().map(|(_, v)| v.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.iter().map(|v| v.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.verifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verifiers.is_empty()
    }
}

//--------------------------------------  GatewayStatusCheck   ---------------------------------------------------------
/// Placeholder for polling the gateways' charge status APIs. It never has evidence of payment, so orders are only
/// confirmed by verifiers registered ahead of, or in addition to, this one.
#[derive(Debug, Clone, Copy, Default)]
pub struct GatewayStatusCheck;

impl GatewayStatusCheck {
    pub const PRIORITY: u8 = 10;
}

#[async_trait]
impl PaymentVerifier for GatewayStatusCheck {
    fn name(&self) -> &str {
        "gateway_status_check"
    }

    async fn check_payment(&self, order: &Order) -> Result<bool, VerifierError> {
        trace!("🔎️ No gateway status API is configured. Order {} cannot be verified by polling", order.order_nsu);
        Ok(false)
    }
}

//--------------------------------------    VerificationApi    ---------------------------------------------------------
/// Sweeps the pending orders and asks the verification chain about each one.
pub struct VerificationApi<B> {
    confirmations: ConfirmationApi<B>,
    chain: VerificationChain,
    stale_after: Duration,
}

impl<B> Debug for VerificationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VerificationApi({:?})", self.chain)
    }
}

impl<B: Clone> Clone for VerificationApi<B> {
    fn clone(&self) -> Self {
        Self { confirmations: self.confirmations.clone(), chain: self.chain.clone(), stale_after: self.stale_after }
    }
}

impl<B> VerificationApi<B> {
    pub fn new(confirmations: ConfirmationApi<B>, chain: VerificationChain) -> Self {
        Self { confirmations, chain, stale_after: Duration::hours(DEFAULT_STALE_ORDER_HOURS) }
    }

    /// Orders pending for longer than this are flagged in the sweep results.
    pub fn with_stale_threshold(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn chain(&self) -> &VerificationChain {
        &self.chain
    }
}

impl<B> VerificationApi<B>
where B: OrderStore
{
    /// Checks every pending order once.
    ///
    /// Only a failure to list the pending orders is returned as an error. Anything that goes wrong with an individual
    /// order is reported in that order's result and the sweep carries on with the next one.
    pub async fn verify_pending_payments(&self) -> Result<VerificationSummary, OrderStoreError> {
        let orders = self.confirmations.db().fetch_pending_orders().await?;
        let now = Utc::now();
        info!("🔎️ Verifying {} pending orders against {:?}", orders.len(), self.chain);
        let mut results = Vec::with_capacity(orders.len());
        for order in &orders {
            results.push(self.verify_order(order, now).await);
        }
        let summary = VerificationSummary::from_results(now, results);
        info!(
            "🔎️ Verification sweep complete. {} checked, {} confirmed, {} still pending, {} errors",
            summary.verified, summary.confirmed, summary.still_pending, summary.errors
        );
        Ok(summary)
    }

    async fn verify_order(&self, order: &Order, now: DateTime<Utc>) -> VerificationResult {
        let nsu = order.order_nsu.clone();
        let mut failures = Vec::new();
        for verifier in self.chain.iter() {
            match verifier.check_payment(order).await {
                Ok(true) => return self.confirm(order, verifier.name()).await,
                Ok(false) => trace!("🔎️ {} has no payment for order {nsu}", verifier.name()),
                Err(e) => {
                    warn!("🔎️ Verifier {} failed for order {nsu}: {e}", verifier.name());
                    failures.push(format!("{}: {e}", verifier.name()));
                },
            }
        }
        if !failures.is_empty() && failures.len() == self.chain.len() {
            return VerificationResult::new(nsu, VerificationStatus::Error).with_message(failures.join("; "));
        }
        let mut result = VerificationResult::new(nsu, VerificationStatus::StillPending);
        let age = order.age(now);
        if age > self.stale_after {
            warn!(
                "🔎️ Order {} has been pending for {} hours. It may need manual attention",
                order.order_nsu,
                age.num_hours()
            );
            result = result.with_message(format!(
                "Pending for {} hours, beyond the {} hour threshold",
                age.num_hours(),
                self.stale_after.num_hours()
            ));
        }
        result
    }

    async fn confirm(&self, order: &Order, source: &str) -> VerificationResult {
        let nsu = order.order_nsu.clone();
        let confirmation = PaymentConfirmation::periodic(order.total_amount, source);
        match self.confirmations.confirm_payment(&nsu, confirmation).await {
            Ok(ConfirmationOutcome::Confirmed(_)) => {
                VerificationResult::new(nsu, VerificationStatus::Confirmed).with_source(source)
            },
            Ok(ConfirmationOutcome::NoOp(NoOpReason::NotPending(status))) if status.is_paid() => {
                VerificationResult::new(nsu, VerificationStatus::Confirmed)
                    .with_source(source)
                    .with_message("Already confirmed by another source")
            },
            Ok(ConfirmationOutcome::NoOp(NoOpReason::NotPending(status))) => {
                warn!("🔎️ {source} reports a payment for order {nsu}, but the order is now {status}");
                VerificationResult::new(nsu, VerificationStatus::Error)
                    .with_source(source)
                    .with_message(format!("Payment found, but the order is {status}"))
            },
            Ok(ConfirmationOutcome::NoOp(NoOpReason::OrderNotFound)) => {
                VerificationResult::new(nsu, VerificationStatus::Error).with_message("The order no longer exists")
            },
            Err(e) => {
                error!("🔎️ Could not confirm order {nsu}: {e}");
                VerificationResult::new(nsu, VerificationStatus::Error).with_message(e.to_string())
            },
        }
    }
}
