//! Mock notifier for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::notifier::{DeliveryReport, Notification, Notifier, NotifierError, SubscriberDelivery};

/// Mock implementation of the Notifier trait.
///
/// Records every published notification, including ones it was told to fail.
#[derive(Debug)]
pub struct MockNotifier {
    published: Arc<RwLock<Vec<Notification>>>,
    fail: Arc<RwLock<bool>>,
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            published: Arc::new(RwLock::new(Vec::new())),
            fail: Arc::new(RwLock::new(false)),
        }
    }

    /// Make every publish fail (or succeed again).
    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    /// Notifications received, in order.
    pub async fn published(&self) -> Vec<Notification> {
        self.published.read().await.clone()
    }

    /// Get the number of publish calls.
    pub async fn publish_count(&self) -> usize {
        self.published.read().await.len()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn publish(&self, notification: &Notification) -> Result<DeliveryReport, NotifierError> {
        self.published.write().await.push(notification.clone());

        if *self.fail.read().await {
            return Err(NotifierError::AllDeliveriesFailed {
                attempted: 1,
                last_error: "simulated delivery failure".to_string(),
            });
        }
        Ok(DeliveryReport {
            deliveries: vec![SubscriberDelivery {
                subscriber: "mock-subscriber".to_string(),
                error: None,
            }],
        })
    }
}
