use std::fmt::Display;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationChannel {
    Email,
    WhatsApp,
}

impl Display for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Email => write!(f, "email"),
            Self::WhatsApp => write!(f, "WhatsApp"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationItem {
    pub name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// The payload accepted by both notification functions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentNotification {
    pub order_nsu: String,
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    /// Order total in reais
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub items: Vec<NotificationItem>,
}

impl PaymentNotification {
    /// The contact details the given channel delivers to, if the customer provided them.
    pub fn contact_for(&self, channel: NotificationChannel) -> Option<&str> {
        let contact = match channel {
            NotificationChannel::Email => self.customer_email.as_deref(),
            NotificationChannel::WhatsApp => self.customer_phone.as_deref(),
        };
        contact.filter(|c| !c.trim().is_empty())
    }

    /// A copy carrying only the contact field relevant to the channel.
    pub fn for_channel(&self, channel: NotificationChannel) -> Self {
        let mut payload = self.clone();
        match channel {
            NotificationChannel::Email => payload.customer_phone = None,
            NotificationChannel::WhatsApp => payload.customer_email = None,
        }
        payload
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No endpoint is configured for the channel
    NotConfigured,
    /// The order carries no contact details for the channel
    MissingContact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationResult {
    Sent { attempts: u32 },
    Skipped(SkipReason),
}
