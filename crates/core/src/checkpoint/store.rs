//! Parameter store trait and the monotonic checkpoint wrapper.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use super::types::Checkpoint;

/// Errors that can occur while reading or writing parameters.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Stored value could not be parsed as a checkpoint.
    #[error("Parameter {name} holds an invalid checkpoint: {value:?}")]
    InvalidValue { name: String, value: String },

    /// Proposed checkpoint does not move forward.
    #[error("Checkpoint must advance: current {current}, proposed {proposed}")]
    NotMonotonic {
        current: Checkpoint,
        proposed: Checkpoint,
    },
}

/// Trait for named key/value parameter backends.
pub trait ParameterStore: Send + Sync {
    /// Get a parameter value, `None` if it was never written.
    fn get_parameter(&self, name: &str) -> Result<Option<String>, CheckpointError>;

    /// Create or overwrite a parameter value.
    fn put_parameter(&self, name: &str, value: &str) -> Result<(), CheckpointError>;
}

/// Reads and advances the GTFS checkpoint stored in a named parameter.
#[derive(Clone)]
pub struct CheckpointStore {
    parameters: Arc<dyn ParameterStore>,
    name: String,
}

impl CheckpointStore {
    pub fn new(parameters: Arc<dyn ParameterStore>, name: impl Into<String>) -> Self {
        Self {
            parameters,
            name: name.into(),
        }
    }

    /// Name of the backing parameter.
    pub fn parameter_name(&self) -> &str {
        &self.name
    }

    /// Load the current checkpoint, `None` if the feed was never ingested.
    pub fn load(&self) -> Result<Option<Checkpoint>, CheckpointError> {
        match self.parameters.get_parameter(&self.name)? {
            None => Ok(None),
            Some(value) => Checkpoint::parse(&value)
                .map(Some)
                .ok_or(CheckpointError::InvalidValue {
                    name: self.name.clone(),
                    value,
                }),
        }
    }

    /// Persist a new checkpoint. It must be strictly newer than the stored one.
    pub fn advance(&self, proposed: Checkpoint) -> Result<(), CheckpointError> {
        if let Some(current) = self.load()? {
            if proposed <= current {
                return Err(CheckpointError::NotMonotonic { current, proposed });
            }
        }

        self.parameters
            .put_parameter(&self.name, &proposed.to_string())?;
        info!(parameter = %self.name, checkpoint = %proposed, "Advanced checkpoint");
        Ok(())
    }
}
