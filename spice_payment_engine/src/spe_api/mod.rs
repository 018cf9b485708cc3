//! The public API of the payment engine.
//!
//! * [`confirmation_api`] holds the confirmation applier, the one place that marks orders as paid, and the handling
//!   of normalised gateway notifications.
//! * [`verification_api`] runs the periodic sweep over pending orders.
//! * [`reconciliation_api`] matches pending orders against bank statements.
pub mod confirmation_api;
pub mod gateway_objects;
pub mod reconciliation_api;
pub mod reconciliation_objects;
pub mod verification_api;
pub mod verification_objects;
