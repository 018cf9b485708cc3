use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{Cents, OrderNsu, PaymentMethod};

/// The payment gateways that push payment notifications to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentGateway {
    InfinitePay,
    PagSeguro,
    Asaas,
}

impl PaymentGateway {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InfinitePay => "infinitepay",
            Self::PagSeguro => "pagseguro",
            Self::Asaas => "asaas",
        }
    }

    /// The value recorded as `confirmation_source` for confirmations pushed by this gateway.
    pub fn webhook_source(&self) -> String {
        format!("{}_webhook", self.as_str())
    }
}

impl Display for PaymentGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The payment status reported by a gateway, normalised across providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayPaymentStatus {
    Paid,
    Pending,
    Failed,
    Refunded,
    Unknown,
}

impl Display for GatewayPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Paid => "paid",
            Self::Pending => "pending",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A gateway notification after it has been validated and converted from the provider's native payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayPaymentEvent {
    pub gateway: PaymentGateway,
    pub order_nsu: OrderNsu,
    /// The amount the gateway reports as paid
    pub amount: Cents,
    pub status: GatewayPaymentStatus,
    /// The gateway's own identifier for the charge
    pub transaction_ref: Option<String>,
    pub method: Option<PaymentMethod>,
}

impl GatewayPaymentEvent {
    pub fn new<N: Into<OrderNsu>>(
        gateway: PaymentGateway,
        order_nsu: N,
        amount: Cents,
        status: GatewayPaymentStatus,
    ) -> Self {
        Self { gateway, order_nsu: order_nsu.into(), amount, status, transaction_ref: None, method: None }
    }

    pub fn with_transaction_ref<S: Into<String>>(mut self, transaction_ref: S) -> Self {
        self.transaction_ref = Some(transaction_ref.into());
        self
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn is_paid(&self) -> bool {
        self.status == GatewayPaymentStatus::Paid
    }
}
