use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
pub use spg_common::Cents;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------       OrderNsu        ---------------------------------------------------------
/// The storefront-facing order reference. Every confirmation source (gateway, polling, bank statement) locates orders
/// by this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNsu(pub String);

impl FromStr for OrderNsu {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConversionError("An order NSU cannot be empty".into()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderNsu {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNsu {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderNsu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderNsu {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// The order has been placed, but no payment has been observed yet.
    Pending,
    /// Awaiting a PIX transfer.
    PendingPix,
    /// Awaiting payment of a boleto.
    PendingBoleto,
    /// Payment has been confirmed by one of the confirmation sources.
    Paid,
    Failed,
    Cancelled,
    Processing,
    Shipped,
    Delivered,
}

impl OrderStatusType {
    /// The statuses from which an order may still transition to `Paid`.
    pub const PENDING: [OrderStatusType; 3] =
        [OrderStatusType::Pending, OrderStatusType::PendingPix, OrderStatusType::PendingBoleto];

    pub fn is_pending(&self) -> bool {
        Self::PENDING.contains(self)
    }

    /// `Paid`, or any fulfilment status that follows it.
    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Paid | Self::Processing | Self::Shipped | Self::Delivered)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PendingPix => "pending_pix",
            Self::PendingBoleto => "pending_boleto",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "pending_pix" => Ok(Self::PendingPix),
            "pending_boleto" => Ok(Self::PendingBoleto),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentMethod      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Pix,
    CreditCard,
    DebitCard,
    Boleto,
}

impl PaymentMethod {
    /// The status a freshly placed order starts in when paid with this method.
    pub fn initial_status(&self) -> OrderStatusType {
        match self {
            Self::Pix => OrderStatusType::PendingPix,
            Self::Boleto => OrderStatusType::PendingBoleto,
            Self::CreditCard | Self::DebitCard => OrderStatusType::Pending,
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pix => "pix",
            Self::CreditCard => "credit_card",
            Self::DebitCard => "debit_card",
            Self::Boleto => "boleto",
        };
        f.write_str(s)
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    /// Accepts our own snake_case names as well as the spellings used by the payment gateways.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pix" => Ok(Self::Pix),
            "credit_card" | "creditcard" | "credit" => Ok(Self::CreditCard),
            "debit_card" | "debitcard" | "debit" => Ok(Self::DebitCard),
            "boleto" | "bank_slip" => Ok(Self::Boleto),
            s => Err(ConversionError(format!("Unknown payment method: {s}"))),
        }
    }
}

//--------------------------------------   ConfirmationMode    ---------------------------------------------------------
/// How a payment confirmation was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationMode {
    /// Pushed by a gateway webhook
    Realtime,
    /// Found by the periodic verification sweep
    Periodic,
    /// Matched against an imported bank statement
    BankStatement,
    /// Confirmed by an operator
    Manual,
    Automatic,
}

impl Display for ConfirmationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Realtime => "realtime",
            Self::Periodic => "periodic",
            Self::BankStatement => "bank_statement",
            Self::Manual => "manual",
            Self::Automatic => "automatic",
        };
        f.write_str(s)
    }
}

//--------------------------------------       LineItem        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub unit_price: Cents,
    pub quantity: u32,
}

impl LineItem {
    pub fn new<S: Into<String>>(name: S, unit_price: Cents, quantity: u32) -> Self {
        Self { name: name.into(), unit_price, quantity }
    }

    pub fn subtotal(&self) -> Cents {
        Cents::from(self.unit_price.value() * i64::from(self.quantity))
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_nsu: OrderNsu,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    #[sqlx(json)]
    pub items: Vec<LineItem>,
    pub total_amount: Cents,
    pub paid_amount: Option<Cents>,
    pub payment_method: Option<PaymentMethod>,
    pub status: OrderStatusType,
    pub confirmation_mode: Option<ConfirmationMode>,
    pub confirmation_source: Option<String>,
    pub transaction_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    /// How long the order has been waiting, measured from its creation.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_nsu: OrderNsu,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub items: Vec<LineItem>,
    /// The total amount due, fixed at creation
    pub total_amount: Cents,
    pub payment_method: Option<PaymentMethod>,
    /// Must be one of the pending statuses
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new<N: Into<OrderNsu>>(order_nsu: N, total_amount: Cents) -> Self {
        Self {
            order_nsu: order_nsu.into(),
            customer_name: None,
            customer_email: None,
            customer_phone: None,
            items: Vec::new(),
            total_amount,
            payment_method: None,
            status: OrderStatusType::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn with_customer(mut self, name: &str, email: Option<&str>, phone: Option<&str>) -> Self {
        self.customer_name = Some(name.to_string());
        self.customer_email = email.map(String::from);
        self.customer_phone = phone.map(String::from);
        self
    }

    pub fn with_item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    /// Sets the payment method, along with the matching initial pending status.
    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self.status = method.initial_status();
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = status;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

//--------------------------------------  PaymentConfirmation  ---------------------------------------------------------
/// The evidence a confirmation source hands to the confirmation applier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub amount: Cents,
    pub mode: ConfirmationMode,
    pub source: String,
    pub transaction_ref: Option<String>,
    /// How the customer actually paid, when the source knows. Replaces the method chosen at checkout.
    pub payment_method: Option<PaymentMethod>,
}

impl PaymentConfirmation {
    pub fn new<S: Into<String>>(amount: Cents, mode: ConfirmationMode, source: S) -> Self {
        Self { amount, mode, source: source.into(), transaction_ref: None, payment_method: None }
    }

    pub fn realtime<S: Into<String>>(amount: Cents, source: S) -> Self {
        Self::new(amount, ConfirmationMode::Realtime, source)
    }

    pub fn periodic<S: Into<String>>(amount: Cents, source: S) -> Self {
        Self::new(amount, ConfirmationMode::Periodic, source)
    }

    pub fn bank_statement<S: Into<String>>(amount: Cents, source: S) -> Self {
        Self::new(amount, ConfirmationMode::BankStatement, source)
    }

    pub fn manual<S: Into<String>>(amount: Cents, source: S) -> Self {
        Self::new(amount, ConfirmationMode::Manual, source)
    }

    pub fn with_transaction_ref(mut self, transaction_ref: Option<String>) -> Self {
        self.transaction_ref = transaction_ref;
        self
    }

    pub fn with_payment_method(mut self, payment_method: Option<PaymentMethod>) -> Self {
        self.payment_method = payment_method;
        self
    }
}
