//! Spice Payment Engine
//!
//! The payment engine decides whether storefront orders have been paid. Evidence of payment arrives from three
//! independent sources:
//! 1. Payment gateway webhooks (InfinitePay, PagSeguro and Asaas), pushed in real time.
//! 2. A periodic sweep that asks a chain of [`PaymentVerifier`]s about every pending order.
//! 3. Bank statement reconciliation, which matches statement lines to pending orders by amount, date and description.
//!
//! All three funnel into [`ConfirmationApi::confirm_payment`], which performs a guarded status update in the
//! [`OrderStore`], so an order can only be marked as paid once no matter how many sources report it.
//!
//! The library is divided into:
//! * Database management ([`mod@traits`] and, with the `sqlite` feature, [`SqliteDatabase`]). The data types used by
//!   the store live in [`mod@db_types`].
//! * The engine API ([`mod@spe_api`]).
//! * Events ([`mod@events`]). An `OrderPaidEvent` is emitted each time an order is confirmed. A small actor framework
//!   lets you hook into these events, e.g. to send notifications, without slowing down the confirming request.
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod spe_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use spe_api::{
    confirmation_api::{ConfirmationApi, ConfirmationOutcome, NoOpReason, WebhookOutcome},
    gateway_objects::{GatewayPaymentEvent, GatewayPaymentStatus, PaymentGateway},
    reconciliation_api::{ReconciliationApi, ReconciliationError, BANK_STATEMENT_SOURCE},
    reconciliation_objects::{
        BankTransaction,
        MatchingRules,
        ReconciliationResult,
        ReconciliationStatus,
        ReconciliationSummary,
        StatementDate,
        TransactionType,
    },
    verification_api::{GatewayStatusCheck, VerificationApi, VerificationChain},
    verification_objects::{VerificationResult, VerificationStatus, VerificationSummary},
};
pub use traits::{OrderStore, OrderStoreError, PaymentVerifier, VerifierError};
