//! Checkpoint value type.

use chrono::{DateTime, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Storage format of the checkpoint parameter.
pub const CHECKPOINT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Format used for time-partitioned raw artifact paths.
const VERSION_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Last-modified time of an ingested upstream feed (UTC, second precision).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Checkpoint(NaiveDateTime);

impl Checkpoint {
    /// Create a checkpoint, truncating to whole seconds.
    pub fn new(at: NaiveDateTime) -> Self {
        Self(at.with_nanosecond(0).unwrap_or(at))
    }

    /// Parse the stored parameter representation.
    pub fn parse(value: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(value.trim(), CHECKPOINT_FORMAT)
            .ok()
            .map(Self::new)
    }

    /// Parse an HTTP date header such as `Mon, 23 Feb 2026 15:00:00 GMT`.
    pub fn from_http_date(value: &str) -> Option<Self> {
        DateTime::parse_from_rfc2822(value.trim())
            .ok()
            .map(|dt| Self::new(dt.naive_utc()))
    }

    /// The underlying UTC timestamp.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.0
    }

    /// Path-safe label used to partition raw artifacts by feed version.
    pub fn version_label(&self) -> String {
        self.0.format(VERSION_FORMAT).to_string()
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CHECKPOINT_FORMAT))
    }
}

impl Serialize for Checkpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Checkpoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Checkpoint::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid checkpoint: {}", s)))
    }
}
