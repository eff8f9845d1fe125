//! Live train location ingestion.
//!
//! Two jobs, independent of the GTFS orchestrator:
//! - **fetch**: poll every line of the Train Tracker API and land one gzipped
//!   newline-delimited JSON sample under a date-partitioned prefix
//! - **process**: flatten one day's samples into a CSV of train positions

mod api;
mod config;
mod error;
mod fetcher;
mod processor;
mod records;

pub use api::{CtaTrainTrackerApi, TrainPositionsApi};
pub use config::TrainLocationsConfig;
pub use error::TrainLocationError;
pub use fetcher::{TrainFetchSummary, TrainLocationFetcher};
pub use processor::{ProcessSummary, TrainLocationProcessor};
pub use records::{flatten_sample_line, PositionsSample, TrainLocationRecord};

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};

/// `{prefix}year=YYYY/month=MM/day=DD/`
pub fn partition_prefix(prefix: &str, date: NaiveDate) -> String {
    format!(
        "{}year={:04}/month={:02}/day={:02}/",
        prefix,
        date.year(),
        date.month(),
        date.day()
    )
}

/// The UTC day before `now`; the daily processing job works one day behind.
pub fn previous_utc_day(now: DateTime<Utc>) -> NaiveDate {
    (now - TimeDelta::days(1)).date_naive()
}
