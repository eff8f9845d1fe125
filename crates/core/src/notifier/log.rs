//! Notifier that only writes to the log.

use async_trait::async_trait;
use tracing::error;

use super::error::NotifierError;
use super::traits::{DeliveryReport, Notification, Notifier};

/// Logs notifications at `error` level. Used when no subscribers are configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn publish(&self, notification: &Notification) -> Result<DeliveryReport, NotifierError> {
        error!(
            subject = %notification.subject,
            message = %notification.message,
            "Pipeline failure notification"
        );
        Ok(DeliveryReport::default())
    }
}
