//! Native webhook payloads of the supported payment gateways.
//!
//! Each gateway posts its own JSON shape. The structs here capture just the fields needed to confirm a payment, and
//! are converted into the engine's [`GatewayPaymentEvent`] with `TryFrom`, which is where the payload is validated.
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use spg_common::Cents;
use spice_payment_engine::{
    db_types::{OrderNsu, PaymentMethod},
    GatewayPaymentEvent,
    GatewayPaymentStatus,
    PaymentGateway,
};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid {gateway} webhook payload. {reason}")]
pub struct GatewayPayloadError {
    pub gateway: PaymentGateway,
    pub reason: String,
}

impl GatewayPayloadError {
    fn new<S: Into<String>>(gateway: PaymentGateway, reason: S) -> Self {
        Self { gateway, reason: reason.into() }
    }
}

fn order_nsu(gateway: PaymentGateway, value: Option<&str>) -> Result<OrderNsu, GatewayPayloadError> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(OrderNsu::from)
        .ok_or_else(|| GatewayPayloadError::new(gateway, "The order reference is missing"))
}

fn payment_method(value: Option<&str>) -> Option<PaymentMethod> {
    value.and_then(|m| m.parse::<PaymentMethod>().ok())
}

//--------------------------------------       InfinitePay       -------------------------------------------------------
/// InfinitePay checkout notification. It is only sent once a payment has been captured. Amounts are in cents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfinitePayWebhook {
    pub order_nsu: Option<String>,
    pub invoice_slug: Option<String>,
    pub amount: i64,
    pub paid_amount: Option<i64>,
    pub installments: Option<u32>,
    pub capture_method: Option<String>,
    pub transaction_nsu: Option<String>,
    pub receipt_url: Option<String>,
}

impl TryFrom<InfinitePayWebhook> for GatewayPaymentEvent {
    type Error = GatewayPayloadError;

    fn try_from(value: InfinitePayWebhook) -> Result<Self, Self::Error> {
        let gateway = PaymentGateway::InfinitePay;
        let nsu = order_nsu(gateway, value.order_nsu.as_deref())?;
        // paid_amount includes any installment interest, so the order amount is what settles the order
        let amount = Cents::from(value.amount);
        if !amount.is_positive() {
            return Err(GatewayPayloadError::new(gateway, format!("Amount must be positive, got {}", value.amount)));
        }
        let mut event = GatewayPaymentEvent::new(gateway, nsu, amount, GatewayPaymentStatus::Paid);
        if let Some(tx) = value.transaction_nsu.or(value.invoice_slug) {
            event = event.with_transaction_ref(tx);
        }
        if let Some(method) = payment_method(value.capture_method.as_deref()) {
            event = event.with_method(method);
        }
        Ok(event)
    }
}

//--------------------------------------        PagSeguro        -------------------------------------------------------
/// PagSeguro order notification. Amounts are in cents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagSeguroWebhook {
    pub id: Option<String>,
    pub reference_id: Option<String>,
    #[serde(default)]
    pub charges: Vec<PagSeguroCharge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagSeguroCharge {
    pub id: String,
    pub status: String,
    pub amount: PagSeguroAmount,
    pub payment_method: Option<PagSeguroPaymentMethod>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagSeguroAmount {
    pub value: i64,
    pub summary: Option<PagSeguroAmountSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagSeguroAmountSummary {
    pub total: Option<i64>,
    pub paid: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagSeguroPaymentMethod {
    #[serde(rename = "type")]
    pub method_type: String,
}

fn pagseguro_status(status: &str) -> GatewayPaymentStatus {
    match status.to_ascii_uppercase().as_str() {
        "PAID" => GatewayPaymentStatus::Paid,
        "AUTHORIZED" | "IN_ANALYSIS" | "WAITING" => GatewayPaymentStatus::Pending,
        "DECLINED" | "CANCELED" => GatewayPaymentStatus::Failed,
        "REFUNDED" => GatewayPaymentStatus::Refunded,
        _ => GatewayPaymentStatus::Unknown,
    }
}

impl TryFrom<PagSeguroWebhook> for GatewayPaymentEvent {
    type Error = GatewayPayloadError;

    fn try_from(value: PagSeguroWebhook) -> Result<Self, Self::Error> {
        let gateway = PaymentGateway::PagSeguro;
        let nsu = order_nsu(gateway, value.reference_id.as_deref())?;
        // A paid charge wins over earlier declined attempts on the same order
        let charge = value
            .charges
            .iter()
            .find(|c| pagseguro_status(&c.status) == GatewayPaymentStatus::Paid)
            .or_else(|| value.charges.first())
            .ok_or_else(|| GatewayPayloadError::new(gateway, "The order has no charges"))?;
        let status = pagseguro_status(&charge.status);
        let paid = charge.amount.summary.as_ref().and_then(|s| s.paid).filter(|p| *p > 0);
        let amount = Cents::from(paid.unwrap_or(charge.amount.value));
        let mut event = GatewayPaymentEvent::new(gateway, nsu, amount, status).with_transaction_ref(charge.id.clone());
        if let Some(method) = payment_method(charge.payment_method.as_ref().map(|m| m.method_type.as_str())) {
            event = event.with_method(method);
        }
        Ok(event)
    }
}

//--------------------------------------          Asaas          -------------------------------------------------------
/// Asaas payment notification. `value` is in reais.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsaasWebhook {
    pub event: String,
    pub payment: AsaasPayment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsaasPayment {
    pub id: String,
    pub value: Decimal,
    pub billing_type: Option<String>,
    pub external_reference: Option<String>,
    pub status: Option<String>,
}

fn asaas_status(event: &str) -> GatewayPaymentStatus {
    match event {
        "PAYMENT_RECEIVED" | "PAYMENT_CONFIRMED" | "PAYMENT_RECEIVED_IN_CASH" => GatewayPaymentStatus::Paid,
        "PAYMENT_CREATED" | "PAYMENT_UPDATED" | "PAYMENT_AWAITING_RISK_ANALYSIS" | "PAYMENT_APPROVED_BY_RISK_ANALYSIS" => {
            GatewayPaymentStatus::Pending
        },
        "PAYMENT_OVERDUE" | "PAYMENT_DELETED" | "PAYMENT_REPROVED_BY_RISK_ANALYSIS" |
        "PAYMENT_CREDIT_CARD_CAPTURE_REFUSED" => GatewayPaymentStatus::Failed,
        "PAYMENT_REFUNDED" | "PAYMENT_PARTIALLY_REFUNDED" | "PAYMENT_CHARGEBACK_REQUESTED" => {
            GatewayPaymentStatus::Refunded
        },
        _ => GatewayPaymentStatus::Unknown,
    }
}

impl TryFrom<AsaasWebhook> for GatewayPaymentEvent {
    type Error = GatewayPayloadError;

    fn try_from(value: AsaasWebhook) -> Result<Self, Self::Error> {
        let gateway = PaymentGateway::Asaas;
        let payment = value.payment;
        let nsu = order_nsu(gateway, payment.external_reference.as_deref())?;
        let amount =
            Cents::try_from_major(payment.value).map_err(|e| GatewayPayloadError::new(gateway, e.to_string()))?;
        let status = asaas_status(value.event.trim());
        let mut event = GatewayPaymentEvent::new(gateway, nsu, amount, status).with_transaction_ref(payment.id);
        if let Some(method) = payment_method(payment.billing_type.as_deref()) {
            event = event.with_method(method);
        }
        Ok(event)
    }
}
