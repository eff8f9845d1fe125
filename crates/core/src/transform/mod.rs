//! Transform tasks deriving analytics artifacts from raw GTFS data.

mod records;
mod schedule;

pub use records::{
    CalendarRecord, ExpectedScheduleRow, RouteRecord, StopRecord, StopTimeRecord, TripRecord,
};
pub use schedule::{
    build_expected_schedule, ExpectedScheduleTask, GtfsTables, EXPECTED_SCHEDULE_FILE, TRAIN_LINES,
};
