//! Cron-driven job scheduling.
//!
//! Each job runs in its own task: sleep until the next fire time, run the
//! job to completion, repeat. A job that overruns its next fire time simply
//! starts late; the orchestrator's own lock handles overlapping triggers.

mod cron_schedule;
mod job;

pub use cron_schedule::{CronSchedule, ScheduleError};
pub use job::spawn_job;
