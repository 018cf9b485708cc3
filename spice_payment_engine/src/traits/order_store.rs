use thiserror::Error;

use crate::db_types::{NewOrder, Order, OrderNsu, PaymentConfirmation};

/// The persistence port of the payment engine.
///
/// Backends only need to provide a handful of primitives. The one operation that changes an order's status,
/// [`OrderStore::confirm_if_pending`], must be a single conditional write, so that any number of concurrent
/// confirmation attempts for the same order produce at most one transition to `paid`.
#[allow(async_fn_in_trait)]
pub trait OrderStore: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new order. This call is idempotent: if an order with the same NSU already exists, the existing record
    /// is returned untouched and the flag in the second position is `false`.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), OrderStoreError>;

    async fn fetch_order_by_nsu(&self, order_nsu: &OrderNsu) -> Result<Option<Order>, OrderStoreError>;

    /// Fetches every order in one of the pending statuses, newest first.
    async fn fetch_pending_orders(&self) -> Result<Vec<Order>, OrderStoreError>;

    /// Marks the order as paid, recording the confirmation details, if and only if it is still pending.
    ///
    /// Returns the updated order when the transition happened, or `None` when no row qualified (the order does not
    /// exist, or it has already left the pending statuses). A `None` result is not an error.
    async fn confirm_if_pending(
        &self,
        order_nsu: &OrderNsu,
        confirmation: &PaymentConfirmation,
    ) -> Result<Option<Order>, OrderStoreError>;

    /// Closes the underlying connection pool.
    async fn close(&mut self) -> Result<(), OrderStoreError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Invalid order: {0}")]
    InvalidOrder(String),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}
