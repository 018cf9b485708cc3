use async_trait::async_trait;
use thiserror::Error;

use crate::db_types::Order;

/// A source of truth that can be polled to find out whether a pending order has been paid.
///
/// Verifiers are object safe so that a [`crate::VerificationChain`] can hold any mix of them.
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    /// The name is recorded as the order's `confirmation_source` when this verifier confirms a payment.
    fn name(&self) -> &str;

    /// Returns `Ok(true)` if the verifier has evidence that the order has been paid in full.
    async fn check_payment(&self, order: &Order) -> Result<bool, VerifierError>;
}

#[derive(Debug, Clone, Error)]
pub enum VerifierError {
    #[error("The payment status source is unavailable: {0}")]
    Unavailable(String),
}
