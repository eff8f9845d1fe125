//! Webhook notifier: POSTs notifications to subscriber URLs.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::NotifierConfig;

use super::error::NotifierError;
use super::traits::{DeliveryReport, Notification, Notifier, SubscriberDelivery};

/// Delivers each notification as a JSON POST to every subscriber.
pub struct WebhookNotifier {
    client: Client,
    subscribers: Vec<String>,
}

impl WebhookNotifier {
    pub fn new(config: &NotifierConfig) -> Result<Self, NotifierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| NotifierError::Client(e.to_string()))?;

        Ok(Self {
            client,
            subscribers: config.subscribers.clone(),
        })
    }

    async fn deliver(&self, url: &str, notification: &Notification) -> Result<(), String> {
        let response = self
            .client
            .post(url)
            .json(notification)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn publish(&self, notification: &Notification) -> Result<DeliveryReport, NotifierError> {
        let mut report = DeliveryReport::default();

        for (index, url) in self.subscribers.iter().enumerate() {
            // URLs may embed tokens, so subscribers are logged by position.
            let error = match self.deliver(url, notification).await {
                Ok(()) => {
                    info!(subscriber = index, subject = %notification.subject, "Notification delivered");
                    None
                }
                Err(e) => {
                    warn!(subscriber = index, error = %e, "Notification delivery failed");
                    Some(e)
                }
            };
            report.deliveries.push(SubscriberDelivery {
                subscriber: format!("subscriber-{}", index),
                error,
            });
        }

        if !report.deliveries.is_empty() && report.delivered() == 0 {
            let last_error = report
                .deliveries
                .last()
                .and_then(|d| d.error.clone())
                .unwrap_or_default();
            return Err(NotifierError::AllDeliveriesFailed {
                attempted: report.deliveries.len(),
                last_error,
            });
        }

        Ok(report)
    }
}
