//! Trait definitions for pipeline tasks.

use async_trait::async_trait;

use super::error::TaskError;
use super::types::{DerivedArtifact, FetchStatus, RawArtifact};

/// Checks the upstream source and persists new raw data.
///
/// Implementations must persist the raw artifact and advance the checkpoint
/// when and only when they report [`FetchStatus::Updated`]. Re-invoking
/// without upstream changes must report [`FetchStatus::Unchanged`] and write
/// nothing.
#[async_trait]
pub trait FetchTask: Send + Sync {
    /// Returns the name of this task.
    fn name(&self) -> &str;

    /// Runs the fetch.
    async fn fetch(&self) -> Result<FetchStatus, TaskError>;
}

/// Produces a derived artifact from freshly fetched raw data.
#[async_trait]
pub trait TransformTask: Send + Sync {
    /// Returns the name of this task.
    fn name(&self) -> &str;

    /// Runs the transform over `raw`.
    async fn transform(&self, raw: &RawArtifact) -> Result<DerivedArtifact, TaskError>;
}
