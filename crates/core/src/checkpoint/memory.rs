//! In-memory parameter store.

use std::collections::HashMap;
use std::sync::Mutex;

use super::store::{CheckpointError, ParameterStore};

/// Parameter store kept in memory; counts writes for test assertions.
#[derive(Debug, Default)]
pub struct MemoryParameterStore {
    values: Mutex<HashMap<String, String>>,
    puts: Mutex<usize>,
}

impl MemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes.
    pub fn put_count(&self) -> usize {
        self.puts.lock().map(|p| *p).unwrap_or(0)
    }
}

impl ParameterStore for MemoryParameterStore {
    fn get_parameter(&self, name: &str) -> Result<Option<String>, CheckpointError> {
        let values = self
            .values
            .lock()
            .map_err(|_| CheckpointError::Database("parameter lock poisoned".to_string()))?;
        Ok(values.get(name).cloned())
    }

    fn put_parameter(&self, name: &str, value: &str) -> Result<(), CheckpointError> {
        self.values
            .lock()
            .map_err(|_| CheckpointError::Database("parameter lock poisoned".to_string()))?
            .insert(name.to_string(), value.to_string());
        if let Ok(mut puts) = self.puts.lock() {
            *puts += 1;
        }
        Ok(())
    }
}
