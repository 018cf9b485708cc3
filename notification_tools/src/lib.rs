//! HTTP client for the storefront's notification functions.
//!
//! When an order is paid the customer receives a confirmation by email and by WhatsApp. Each channel is served by an
//! external function that accepts a [`PaymentNotification`] as JSON.
mod api;
mod config;
mod error;

mod data_objects;

pub use api::NotificationApi;
pub use config::NotificationConfig;
pub use data_objects::{NotificationChannel, NotificationItem, NotificationResult, PaymentNotification, SkipReason};
pub use error::NotificationApiError;
