use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    StatusCode,
};

use crate::{
    config::NotificationConfig,
    data_objects::{NotificationChannel, NotificationResult, PaymentNotification, SkipReason},
    NotificationApiError,
};

/// Posts payment notifications to the email and WhatsApp functions.
#[derive(Clone)]
pub struct NotificationApi {
    config: NotificationConfig,
    client: Arc<Client>,
}

impl NotificationApi {
    pub fn new(config: NotificationConfig) -> Result<Self, NotificationApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !config.api_key.is_empty() {
            let val = HeaderValue::from_str(&format!("Bearer {}", config.api_key.reveal()))
                .map_err(|e| NotificationApiError::Initialization(e.to_string()))?;
            headers.insert(AUTHORIZATION, val);
        }
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotificationApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &NotificationConfig {
        &self.config
    }

    pub fn is_enabled(&self, channel: NotificationChannel) -> bool {
        self.url_for(channel).is_some()
    }

    fn url_for(&self, channel: NotificationChannel) -> Option<&str> {
        match channel {
            NotificationChannel::Email => self.config.email_url.as_deref(),
            NotificationChannel::WhatsApp => self.config.whatsapp_url.as_deref(),
        }
    }

    pub async fn send_email(&self, notification: &PaymentNotification) -> Result<NotificationResult, NotificationApiError> {
        self.send(NotificationChannel::Email, notification).await
    }

    pub async fn send_whatsapp(
        &self,
        notification: &PaymentNotification,
    ) -> Result<NotificationResult, NotificationApiError> {
        self.send(NotificationChannel::WhatsApp, notification).await
    }

    /// Delivers the notification on the given channel.
    ///
    /// Nothing is sent if the channel has no endpoint or the customer has no contact details for it. Network errors
    /// and 5xx responses are retried up to `max_attempts` times with a linearly growing delay. Any other non-success
    /// response fails immediately.
    pub async fn send(
        &self,
        channel: NotificationChannel,
        notification: &PaymentNotification,
    ) -> Result<NotificationResult, NotificationApiError> {
        let Some(url) = self.url_for(channel) else {
            debug!("📣️ No {channel} endpoint configured. Skipping notification for {}", notification.order_nsu);
            return Ok(NotificationResult::Skipped(SkipReason::NotConfigured));
        };
        if notification.contact_for(channel).is_none() {
            debug!("📣️ Order {} has no {channel} contact. Skipping notification", notification.order_nsu);
            return Ok(NotificationResult::Skipped(SkipReason::MissingContact));
        }
        let body = notification.for_channel(channel);
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = String::default();
        for attempt in 1..=max_attempts {
            trace!("📣️ Sending {channel} notification for {} (attempt {attempt})", body.order_nsu);
            match self.client.post(url).json(&body).send().await {
                Ok(response) if response.status().is_success() => {
                    info!("📣️ {channel} notification for order {} sent", body.order_nsu);
                    return Ok(NotificationResult::Sent { attempts: attempt });
                },
                Ok(response) => {
                    let status = response.status();
                    let message = response.text().await.unwrap_or_default();
                    if !is_retryable(status) {
                        return Err(NotificationApiError::Rejected { status: status.as_u16(), message });
                    }
                    last_error = format!("{status}: {message}");
                },
                Err(e) => last_error = e.to_string(),
            }
            warn!("📣️ {channel} notification for {} failed (attempt {attempt}/{max_attempts}): {last_error}", body.order_nsu);
            if attempt < max_attempts {
                tokio::time::sleep(self.config.retry_backoff * attempt).await;
            }
        }
        Err(NotificationApiError::RetriesExhausted { attempts: max_attempts, last_error })
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::REQUEST_TIMEOUT
}
