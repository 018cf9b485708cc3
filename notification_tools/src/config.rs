use std::time::Duration;

use log::*;
use spg_common::Secret;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// The endpoint of the payment confirmation email function. Email notifications are disabled when unset.
    pub email_url: Option<String>,
    /// The endpoint of the WhatsApp message function. WhatsApp notifications are disabled when unset.
    pub whatsapp_url: Option<String>,
    /// Sent as a bearer token with every notification request
    pub api_key: Secret<String>,
    pub max_attempts: u32,
    pub timeout: Duration,
    /// The delay before the n-th retry is `n * retry_backoff`
    pub retry_backoff: Duration,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            email_url: None,
            whatsapp_url: None,
            api_key: Secret::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

impl NotificationConfig {
    pub fn new_from_env_or_default() -> Self {
        let email_url = optional_url("SPG_EMAIL_NOTIFY_URL");
        let whatsapp_url = optional_url("SPG_WHATSAPP_NOTIFY_URL");
        let api_key = Secret::new(std::env::var("SPG_NOTIFY_API_KEY").unwrap_or_else(|_| {
            if email_url.is_some() || whatsapp_url.is_some() {
                warn!("📣️ SPG_NOTIFY_API_KEY is not set. Notifications will be sent without an Authorization header");
            }
            String::default()
        }));
        let max_attempts = std::env::var("SPG_NOTIFY_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .map_err(|e| warn!("📣️ Invalid SPG_NOTIFY_MAX_ATTEMPTS '{s}': {e}. Using the default."))
                    .ok()
            })
            .unwrap_or(DEFAULT_MAX_ATTEMPTS)
            .max(1);
        let timeout = std::env::var("SPG_NOTIFY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("📣️ Invalid SPG_NOTIFY_TIMEOUT_SECS '{s}': {e}. Using the default."))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Self { email_url, whatsapp_url, api_key, max_attempts, timeout, ..Default::default() }
    }

    pub fn with_email_url<S: Into<String>>(mut self, url: S) -> Self {
        self.email_url = Some(url.into());
        self
    }

    pub fn with_whatsapp_url<S: Into<String>>(mut self, url: S) -> Self {
        self.whatsapp_url = Some(url.into());
        self
    }

    pub fn with_api_key<S: Into<String>>(mut self, key: S) -> Self {
        self.api_key = Secret::new(key.into());
        self
    }

    pub fn with_retries(mut self, max_attempts: u32, backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_backoff = backoff;
        self
    }
}

fn optional_url(var: &str) -> Option<String> {
    match std::env::var(var) {
        Ok(url) if !url.trim().is_empty() => Some(url.trim().to_string()),
        _ => {
            info!("📣️ {var} is not set. This notification channel is disabled.");
            None
        },
    }
}
