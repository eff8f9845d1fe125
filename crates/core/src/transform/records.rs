//! Row types for the GTFS files the expected schedule is built from.
//!
//! Only the columns the join needs are deserialized; the csv crate ignores
//! the rest. Values are kept as strings so they are written back verbatim.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct RouteRecord {
    pub route_id: String,
    pub route_long_name: String,
    #[serde(default)]
    pub route_color: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TripRecord {
    pub route_id: String,
    pub service_id: String,
    pub trip_id: String,
    #[serde(default)]
    pub direction_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarRecord {
    pub service_id: String,
    pub monday: String,
    pub tuesday: String,
    pub wednesday: String,
    pub thursday: String,
    pub friday: String,
    pub saturday: String,
    pub sunday: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopTimeRecord {
    pub trip_id: String,
    pub arrival_time: String,
    pub departure_time: String,
    pub stop_id: String,
    pub stop_sequence: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopRecord {
    pub stop_id: String,
    pub stop_name: String,
}

/// One scheduled arrival of a rail trip at a station platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpectedScheduleRow {
    pub route_id: String,
    pub route_long_name: String,
    pub route_color: String,
    pub service_id: String,
    pub trip_id: String,
    pub direction_id: String,
    pub monday: String,
    pub tuesday: String,
    pub wednesday: String,
    pub thursday: String,
    pub friday: String,
    pub saturday: String,
    pub sunday: String,
    pub arrival_time: String,
    pub departure_time: String,
    pub stop_id: String,
    pub stop_sequence: String,
    pub stop_name: String,
}
