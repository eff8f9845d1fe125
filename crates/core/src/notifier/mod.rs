//! Failure notification delivery.
//!
//! The orchestrator publishes one [`Notification`] per failed run through a
//! [`Notifier`]. Delivery is best-effort: callers log the outcome and move on.

mod error;
mod log;
mod traits;
mod webhook;

pub use error::NotifierError;
pub use log::LogNotifier;
pub use traits::{DeliveryReport, Notification, Notifier, SubscriberDelivery};
pub use webhook::WebhookNotifier;

use std::sync::Arc;

use crate::config::NotifierConfig;

/// Build the notifier for the given configuration.
///
/// Falls back to [`LogNotifier`] when no subscribers are configured.
pub fn create_notifier(config: &NotifierConfig) -> Result<Arc<dyn Notifier>, NotifierError> {
    if config.subscribers.is_empty() {
        return Ok(Arc::new(LogNotifier::new()));
    }
    Ok(Arc::new(WebhookNotifier::new(config)?))
}
