//! # Engine ports
//!
//! The traits in this module are the seams between the payment engine and the outside world.
//!
//! * [`OrderStore`] defines the persistence primitives a database backend must provide.
//! * [`PaymentVerifier`] is implemented by anything that can be polled for the payment status of an order.
mod order_store;
mod payment_verifier;

pub use order_store::{OrderStore, OrderStoreError};
pub use payment_verifier::{PaymentVerifier, VerifierError};
