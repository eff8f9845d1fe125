//! Object storage for raw and derived pipeline artifacts.
//!
//! Objects are addressed by slash-separated keys (`gtfs_data/version=.../stops.txt`).
//! Two backends are provided:
//!
//! - [`FsObjectStore`] maps keys onto files below a root directory, writing
//!   through a temporary file so readers never observe partial objects.
//! - [`MemoryObjectStore`] keeps objects in memory for tests and dry runs.
//!
//! Raw artifacts are written with [`ObjectStore::put_if_absent`] so that an
//! object, once created, is never mutated.

mod error;
mod fs_store;
mod memory;
mod traits;

pub use error::StorageError;
pub use fs_store::FsObjectStore;
pub use memory::MemoryObjectStore;
pub use traits::{validate_key, ObjectMeta, ObjectStore};
