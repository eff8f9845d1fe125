//! Cron expression wrapper.

use chrono::{DateTime, Utc};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors from parsing a schedule.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid cron expression {expression:?}: {message}")]
    Invalid { expression: String, message: String },
}

/// A parsed cron expression (seconds resolution, evaluated in UTC).
///
/// Fields: `sec min hour day-of-month month day-of-week [year]`.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    schedule: cron::Schedule,
}

impl CronSchedule {
    pub fn parse(expression: &str) -> Result<Self, ScheduleError> {
        let schedule =
            cron::Schedule::from_str(expression.trim()).map_err(|e| ScheduleError::Invalid {
                expression: expression.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            expression: expression.trim().to_string(),
            schedule,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First fire time strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }

    /// Time to wait from `now` until the next fire time.
    pub fn until_next(&self, now: DateTime<Utc>) -> Option<Duration> {
        let next = self.next_after(now)?;
        Some((next - now).to_std().unwrap_or(Duration::ZERO))
    }
}
