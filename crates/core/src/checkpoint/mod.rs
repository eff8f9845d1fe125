//! GTFS checkpoint persistence.
//!
//! The checkpoint is a single named parameter holding the `Last-Modified`
//! time of the most recently ingested feed, formatted `%Y-%m-%dT%H:%M:%S`.
//! [`CheckpointStore`] layers the monotonic-advance rule on top of any
//! [`ParameterStore`].

mod memory;
mod sqlite_store;
mod store;
mod types;

pub use memory::MemoryParameterStore;
pub use sqlite_store::SqliteParameterStore;
pub use store::{CheckpointError, CheckpointStore, ParameterStore};
pub use types::Checkpoint;
