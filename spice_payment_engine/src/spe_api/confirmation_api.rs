use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, OrderNsu, OrderStatusType, PaymentConfirmation},
    events::{EventProducers, OrderPaidEvent},
    spe_api::gateway_objects::GatewayPaymentEvent,
    traits::{OrderStore, OrderStoreError},
};

/// Why a confirmation attempt did not change anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoOpReason {
    /// The order had already left the pending statuses. Carries the status it was found in.
    NotPending(OrderStatusType),
    OrderNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// This call moved the order to `paid`.
    Confirmed(Order),
    /// Nothing was written. Not an error: another source got there first, or the order is unknown.
    NoOp(NoOpReason),
}

impl ConfirmationOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The event did not report a completed payment, and was acknowledged without any change.
    Ignored(GatewayPaymentEvent),
    Processed(ConfirmationOutcome),
}

/// `ConfirmationApi` is the single place where orders become `paid`.
///
/// Every confirmation source (gateway webhooks, the periodic verifier, bank statement reconciliation and operators)
/// funnels through [`ConfirmationApi::confirm_payment`]. The store applies the change with a conditional write, and
/// the `OrderPaidEvent` is published only by the call that actually performed the transition, so notifications are
/// sent at most once per order.
pub struct ConfirmationApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ConfirmationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConfirmationApi")
    }
}

impl<B: Clone> Clone for ConfirmationApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), producers: self.producers.clone() }
    }
}

impl<B> ConfirmationApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> ConfirmationApi<B>
where B: OrderStore
{
    pub async fn confirm_payment(
        &self,
        order_nsu: &OrderNsu,
        confirmation: PaymentConfirmation,
    ) -> Result<ConfirmationOutcome, OrderStoreError> {
        trace!("✅️ Confirming payment for order {order_nsu} via {} ({})", confirmation.source, confirmation.mode);
        match self.db.confirm_if_pending(order_nsu, &confirmation).await? {
            Some(order) => {
                info!(
                    "✅️ Order {order_nsu} is paid. {} confirmed by {} ({})",
                    confirmation.amount, confirmation.source, confirmation.mode
                );
                if confirmation.amount != order.total_amount {
                    warn!(
                        "✅️ Order {order_nsu} was confirmed with {} but its total is {}",
                        confirmation.amount, order.total_amount
                    );
                }
                self.call_order_paid_hook(&order).await;
                Ok(ConfirmationOutcome::Confirmed(order))
            },
            None => {
                // Only used for reporting. The guarded write above is what decides.
                let reason = match self.db.fetch_order_by_nsu(order_nsu).await? {
                    Some(order) => NoOpReason::NotPending(order.status),
                    None => NoOpReason::OrderNotFound,
                };
                match &reason {
                    NoOpReason::NotPending(status) => debug!(
                        "✅️ Order {order_nsu} is already {status}. Confirmation from {} ignored",
                        confirmation.source
                    ),
                    NoOpReason::OrderNotFound => {
                        warn!("✅️ Confirmation from {} for unknown order {order_nsu}", confirmation.source)
                    },
                }
                Ok(ConfirmationOutcome::NoOp(reason))
            },
        }
    }

    /// Applies a normalised gateway notification. Only events reporting a completed payment touch the store.
    pub async fn process_gateway_event(&self, event: GatewayPaymentEvent) -> Result<WebhookOutcome, OrderStoreError> {
        if !event.is_paid() {
            info!(
                "🪝️ {} reported status '{}' for order {}. Nothing to do.",
                event.gateway, event.status, event.order_nsu
            );
            return Ok(WebhookOutcome::Ignored(event));
        }
        let confirmation = PaymentConfirmation::realtime(event.amount, event.gateway.webhook_source())
            .with_transaction_ref(event.transaction_ref.clone())
            .with_payment_method(event.method);
        let outcome = self.confirm_payment(&event.order_nsu, confirmation).await?;
        Ok(WebhookOutcome::Processed(outcome))
    }

    async fn call_order_paid_hook(&self, order: &Order) {
        if self.producers.order_paid_producer.is_empty() {
            return;
        }
        debug!("✅️ Notifying order paid hook subscribers for {}", order.order_nsu);
        self.producers.publish_order_paid(OrderPaidEvent::new(order.clone())).await;
    }
}
