use serde::{Deserialize, Serialize};

use crate::db_types::Order;

/// Published exactly once per order, by the confirmation applier, when the order transitions to `paid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}
