//! Expected rail schedule transform.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::metrics;
use crate::storage::{ObjectStore, StorageError};
use crate::task::{DerivedArtifact, RawArtifact, TaskError, TransformTask};

use super::records::{
    CalendarRecord, ExpectedScheduleRow, RouteRecord, StopRecord, StopTimeRecord, TripRecord,
};

/// File name of the derived schedule.
pub const EXPECTED_SCHEDULE_FILE: &str = "gtfs_expected_cta_schedule.csv";

/// `route_long_name` values of the rail lines kept in the schedule.
pub const TRAIN_LINES: [&str; 8] = [
    "Red Line",
    "Purple Line",
    "Yellow Line",
    "Blue Line",
    "Pink Line",
    "Green Line",
    "Orange Line",
    "Brown Line",
];

/// Rail platform stop ids live in `[30000, 40000)`.
const PLATFORM_STOP_IDS: std::ops::Range<u32> = 30000..40000;

fn is_platform_stop(stop_id: &str) -> bool {
    stop_id
        .trim()
        .parse::<u32>()
        .map(|id| PLATFORM_STOP_IDS.contains(&id))
        .unwrap_or(false)
}

fn read_records<T: DeserializeOwned>(file: &str, data: &[u8]) -> Result<Vec<T>, TaskError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(data);
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| TaskError::parse(file, e))
}

/// Raw GTFS tables the schedule is built from.
pub struct GtfsTables {
    pub calendar: Vec<CalendarRecord>,
    pub routes: Vec<RouteRecord>,
    pub stops: Vec<StopRecord>,
    pub stop_times: Vec<StopTimeRecord>,
    pub trips: Vec<TripRecord>,
}

impl GtfsTables {
    /// Input files, in the order they are read.
    pub const FILES: [&'static str; 5] = [
        "calendar.txt",
        "routes.txt",
        "stops.txt",
        "stop_times.txt",
        "trips.txt",
    ];

    fn parse(files: &HashMap<&'static str, Vec<u8>>) -> Result<Self, TaskError> {
        let get = |name: &'static str| -> Result<&[u8], TaskError> {
            files
                .get(name)
                .map(Vec::as_slice)
                .ok_or_else(|| TaskError::MissingInput {
                    key: name.to_string(),
                })
        };

        Ok(Self {
            calendar: read_records("calendar.txt", get("calendar.txt")?)?,
            routes: read_records("routes.txt", get("routes.txt")?)?,
            stops: read_records("stops.txt", get("stops.txt")?)?,
            stop_times: read_records("stop_times.txt", get("stop_times.txt")?)?,
            trips: read_records("trips.txt", get("trips.txt")?)?,
        })
    }
}

/// Joins the GTFS tables into one row per rail trip stop.
///
/// Routes are limited to [`TRAIN_LINES`] and stops to platform ids. Rows
/// follow route file order, then trip order, then stop time order.
pub fn build_expected_schedule(tables: &GtfsTables) -> Vec<ExpectedScheduleRow> {
    let mut trips_by_route: HashMap<&str, Vec<&TripRecord>> = HashMap::new();
    for trip in &tables.trips {
        trips_by_route.entry(&trip.route_id).or_default().push(trip);
    }

    let mut calendar_by_service: HashMap<&str, Vec<&CalendarRecord>> = HashMap::new();
    for service in &tables.calendar {
        calendar_by_service
            .entry(&service.service_id)
            .or_default()
            .push(service);
    }

    let mut stop_times_by_trip: HashMap<&str, Vec<&StopTimeRecord>> = HashMap::new();
    for stop_time in tables
        .stop_times
        .iter()
        .filter(|st| is_platform_stop(&st.stop_id))
    {
        stop_times_by_trip
            .entry(&stop_time.trip_id)
            .or_default()
            .push(stop_time);
    }

    let mut stops_by_id: HashMap<&str, Vec<&StopRecord>> = HashMap::new();
    for stop in tables.stops.iter().filter(|s| is_platform_stop(&s.stop_id)) {
        stops_by_id.entry(&stop.stop_id).or_default().push(stop);
    }

    let mut rows = Vec::new();
    let rail_routes = tables
        .routes
        .iter()
        .filter(|r| TRAIN_LINES.contains(&r.route_long_name.as_str()));

    for route in rail_routes {
        let Some(trips) = trips_by_route.get(route.route_id.as_str()) else {
            continue;
        };
        for trip in trips {
            let Some(services) = calendar_by_service.get(trip.service_id.as_str()) else {
                continue;
            };
            let Some(stop_times) = stop_times_by_trip.get(trip.trip_id.as_str()) else {
                continue;
            };
            for service in services {
                for stop_time in stop_times {
                    let Some(stops) = stops_by_id.get(stop_time.stop_id.as_str()) else {
                        continue;
                    };
                    for stop in stops {
                        rows.push(ExpectedScheduleRow {
                            route_id: route.route_id.clone(),
                            route_long_name: route.route_long_name.clone(),
                            route_color: route.route_color.clone(),
                            service_id: trip.service_id.clone(),
                            trip_id: trip.trip_id.clone(),
                            direction_id: trip.direction_id.clone(),
                            monday: service.monday.clone(),
                            tuesday: service.tuesday.clone(),
                            wednesday: service.wednesday.clone(),
                            thursday: service.thursday.clone(),
                            friday: service.friday.clone(),
                            saturday: service.saturday.clone(),
                            sunday: service.sunday.clone(),
                            arrival_time: stop_time.arrival_time.clone(),
                            departure_time: stop_time.departure_time.clone(),
                            stop_id: stop_time.stop_id.clone(),
                            stop_sequence: stop_time.stop_sequence.clone(),
                            stop_name: stop.stop_name.clone(),
                        });
                    }
                }
            }
        }
    }

    rows
}

fn encode_rows(rows: &[ExpectedScheduleRow]) -> Result<Vec<u8>, TaskError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| TaskError::Encode(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| TaskError::Encode(e.to_string()))
}

/// Builds the expected CTA rail schedule from a raw GTFS artifact.
pub struct ExpectedScheduleTask {
    store: Arc<dyn ObjectStore>,
    derived_prefix: String,
}

impl ExpectedScheduleTask {
    pub fn new(store: Arc<dyn ObjectStore>, derived_prefix: impl Into<String>) -> Self {
        Self {
            store,
            derived_prefix: derived_prefix.into(),
        }
    }

    /// Key the derived schedule is written to.
    pub fn output_key(&self) -> String {
        format!("{}{}", self.derived_prefix, EXPECTED_SCHEDULE_FILE)
    }

    async fn read_inputs(
        &self,
        raw: &RawArtifact,
    ) -> Result<HashMap<&'static str, Vec<u8>>, TaskError> {
        let mut files = HashMap::new();
        for file in GtfsTables::FILES {
            let key = raw.key(file);
            let data = self.store.get(&key).await.map_err(|e| match e {
                StorageError::NotFound { key } => TaskError::MissingInput { key },
                other => TaskError::Storage(other),
            })?;
            debug!(key = %key, bytes = data.len(), "Read GTFS file");
            files.insert(file, data);
        }
        Ok(files)
    }
}

#[async_trait]
impl TransformTask for ExpectedScheduleTask {
    fn name(&self) -> &str {
        "gtfs_expected_schedule"
    }

    async fn transform(&self, raw: &RawArtifact) -> Result<DerivedArtifact, TaskError> {
        info!(prefix = %raw.prefix, version = %raw.version, "Building expected schedule");
        let files = self.read_inputs(raw).await?;

        let (rows, body) = tokio::task::spawn_blocking(move || {
            let tables = GtfsTables::parse(&files)?;
            let rows = build_expected_schedule(&tables);
            let body = encode_rows(&rows)?;
            Ok::<_, TaskError>((rows.len(), body))
        })
        .await
        .map_err(|e| TaskError::Encode(format!("schedule build task failed: {}", e)))??;

        let key = self.output_key();
        self.store.put(&key, body).await?;
        metrics::SCHEDULE_ROWS_WRITTEN.inc_by(rows as u64);
        info!(key = %key, rows, "Wrote expected schedule");

        Ok(DerivedArtifact {
            key,
            rows,
            source_version: raw.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::Checkpoint;
    use crate::storage::MemoryObjectStore;
    use crate::testing::fixtures;

    async fn seeded_store(prefix: &str) -> Arc<MemoryObjectStore> {
        let store = Arc::new(MemoryObjectStore::new());
        for (name, data) in fixtures::gtfs_files() {
            store
                .put(&format!("{}{}", prefix, name), data.as_bytes().to_vec())
                .await
                .unwrap();
        }
        store
    }

    fn raw(prefix: &str) -> RawArtifact {
        RawArtifact {
            version: Checkpoint::parse("2026-02-23T15:00:00").unwrap(),
            prefix: prefix.to_string(),
            files: GtfsTables::FILES.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn test_platform_stop_range() {
        assert!(is_platform_stop("30000"));
        assert!(is_platform_stop("39999"));
        assert!(!is_platform_stop("40000"));
        assert!(!is_platform_stop("29999"));
        assert!(!is_platform_stop("abc"));
    }

    #[tokio::test]
    async fn test_transform_writes_expected_schedule() {
        let prefix = "gtfs_data/version=20260223T150000Z/";
        let store = seeded_store(prefix).await;
        let task = ExpectedScheduleTask::new(store.clone(), "derived/");

        let derived = task.transform(&raw(prefix)).await.unwrap();

        assert_eq!(derived.key, "derived/gtfs_expected_cta_schedule.csv");
        assert_eq!(derived.rows, 3);
        assert_eq!(derived.source_version, raw(prefix).version);

        let csv = String::from_utf8(store.get(&derived.key).await.unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "route_id,route_long_name,route_color,service_id,trip_id,direction_id,\
             monday,tuesday,wednesday,thursday,friday,saturday,sunday,\
             arrival_time,departure_time,stop_id,stop_sequence,stop_name"
        );
        assert_eq!(
            lines.next().unwrap(),
            "Red,Red Line,c60c30,W1,R1,1,1,1,1,1,1,0,0,05:00:00,05:00:00,30001,1,Howard (95th-bound)"
        );
        assert_eq!(lines.count(), 2);
    }

    #[tokio::test]
    async fn test_transform_filters_bus_routes_and_stations() {
        let prefix = "gtfs_data/v/";
        let store = seeded_store(prefix).await;
        let task = ExpectedScheduleTask::new(store.clone(), "derived/");

        task.transform(&raw(prefix)).await.unwrap();

        let csv = String::from_utf8(store.get(&task.output_key()).await.unwrap()).unwrap();
        assert!(!csv.contains("Clark"));
        assert!(!csv.contains("40003"));
        assert!(!csv.contains("BUS1"));
    }

    #[tokio::test]
    async fn test_transform_missing_file_fails() {
        let prefix = "gtfs_data/v/";
        let store = Arc::new(MemoryObjectStore::new());
        store
            .put(&format!("{}calendar.txt", prefix), b"service_id\n".to_vec())
            .await
            .unwrap();
        let task = ExpectedScheduleTask::new(store.clone(), "derived/");

        let err = task.transform(&raw(prefix)).await.unwrap_err();
        match err {
            TaskError::MissingInput { key } => assert_eq!(key, "gtfs_data/v/routes.txt"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!store.exists(&task.output_key()).await.unwrap());
    }

    #[tokio::test]
    async fn test_transform_rejects_malformed_csv() {
        let prefix = "gtfs_data/v/";
        let store = seeded_store(prefix).await;
        store
            .put(&format!("{}routes.txt", prefix), b"route_id\nRed\n".to_vec())
            .await
            .unwrap();
        let task = ExpectedScheduleTask::new(store, "derived/");

        let err = task.transform(&raw(prefix)).await.unwrap_err();
        assert!(matches!(err, TaskError::Parse { ref file, .. } if file == "routes.txt"));
    }

    #[test]
    fn test_build_joins_multiple_services() {
        let tables = GtfsTables {
            calendar: vec![
                calendar("W1", "1", "0"),
                calendar("W1", "0", "1"),
            ],
            routes: vec![RouteRecord {
                route_id: "P".into(),
                route_long_name: "Purple Line".into(),
                route_color: "522398".into(),
            }],
            stops: vec![StopRecord {
                stop_id: "30203".into(),
                stop_name: "Linden".into(),
            }],
            stop_times: vec![StopTimeRecord {
                trip_id: "P1".into(),
                arrival_time: "08:00:00".into(),
                departure_time: "08:01:00".into(),
                stop_id: "30203".into(),
                stop_sequence: "1".into(),
            }],
            trips: vec![TripRecord {
                route_id: "P".into(),
                service_id: "W1".into(),
                trip_id: "P1".into(),
                direction_id: "0".into(),
            }],
        };

        let rows = build_expected_schedule(&tables);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].monday, "1");
        assert_eq!(rows[1].sunday, "1");
        assert_eq!(rows[0].stop_name, "Linden");
    }

    fn calendar(service_id: &str, monday: &str, sunday: &str) -> CalendarRecord {
        CalendarRecord {
            service_id: service_id.into(),
            monday: monday.into(),
            tuesday: "0".into(),
            wednesday: "0".into(),
            thursday: "0".into(),
            friday: "0".into(),
            saturday: "0".into(),
            sunday: sunday.into(),
        }
    }
}
