//! Notifier trait and message types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::NotifierError;

/// A failure message published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub subject: String,
    pub message: String,
}

impl Notification {
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

/// Outcome of delivering to a single subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriberDelivery {
    pub subscriber: String,
    /// `None` on success, the failure reason otherwise.
    pub error: Option<String>,
}

/// Per-subscriber results of one publish.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub deliveries: Vec<SubscriberDelivery>,
}

impl DeliveryReport {
    pub fn delivered(&self) -> usize {
        self.deliveries.iter().filter(|d| d.error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.deliveries.len() - self.delivered()
    }
}

/// Publishes notifications to the current subscriber list.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Deliver `notification` to every subscriber.
    ///
    /// Returns an error only when nothing could be delivered.
    async fn publish(&self, notification: &Notification) -> Result<DeliveryReport, NotifierError>;
}
