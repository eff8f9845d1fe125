//! Error types for the notifier module.

use thiserror::Error;

/// Errors that can occur while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifierError {
    /// HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// Every subscriber delivery failed.
    #[error("Notification delivery failed for all {attempted} subscriber(s): {last_error}")]
    AllDeliveriesFailed { attempted: usize, last_error: String },
}
