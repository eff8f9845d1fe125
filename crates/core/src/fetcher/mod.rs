//! GTFS feed fetch task.
//!
//! Downloads the zipped feed, compares its `Last-Modified` header with the
//! stored checkpoint, and when the feed is newer lands every file of the
//! archive under a version-partitioned prefix before advancing the
//! checkpoint.

mod gtfs;
mod source;

pub use gtfs::GtfsFetchTask;
pub use source::{FeedDownload, FeedSource, HttpFeedSource};
