//! Task contracts consumed by the pipeline orchestrator.
//!
//! A run invokes a [`FetchTask`] first. Only an [`FetchStatus::Updated`]
//! result carries a [`RawArtifact`], and a [`TransformTask`] can only be
//! invoked with one, so "transform after a successful fetch" is enforced by
//! the types rather than by call ordering.

mod error;
mod traits;
mod types;

pub use error::TaskError;
pub use traits::{FetchTask, TransformTask};
pub use types::{DerivedArtifact, FetchStatus, RawArtifact};
