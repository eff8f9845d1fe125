//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the pipeline's task, notifier
//! and upstream source traits, allowing orchestration and end-to-end tests
//! without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use cta_pipeline_core::testing::{fixtures, MockFeedSource, MockNotifier};
//!
//! let source = MockFeedSource::with_feed(fixtures::GTFS_LAST_MODIFIED, fixtures::gtfs_zip());
//! let notifier = MockNotifier::new();
//!
//! // Wire into GtfsFetchTask / PipelineOrchestrator...
//! ```

mod mock_feed_source;
mod mock_notifier;
mod mock_tasks;
mod mock_train_api;

pub use mock_feed_source::MockFeedSource;
pub use mock_notifier::MockNotifier;
pub use mock_tasks::{MockFetchTask, MockTransformTask};
pub use mock_train_api::MockTrainPositionsApi;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;

    use crate::checkpoint::Checkpoint;
    use crate::task::RawArtifact;

    /// `Last-Modified` header matching [`gtfs_zip`].
    pub const GTFS_LAST_MODIFIED: &str = "Mon, 23 Feb 2026 15:00:00 GMT";

    /// A miniature CTA feed: two rail routes and one bus route.
    ///
    /// Joined and filtered it yields three schedule rows: Red Line trip R1 at
    /// stops 30001 and 30002, and Brown Line trip B1 at stop 30003.
    pub fn gtfs_files() -> Vec<(&'static str, &'static str)> {
        vec![
            (
                "calendar.txt",
                "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
                 W1,1,1,1,1,1,0,0,20260101,20261231\n",
            ),
            (
                "routes.txt",
                "route_id,route_short_name,route_long_name,route_type,route_url,route_color,route_text_color\n\
                 Red,,Red Line,1,,c60c30,ffffff\n\
                 Brn,,Brown Line,1,,62361b,ffffff\n\
                 22,22,Clark,3,,565a5c,ffffff\n",
            ),
            (
                "stops.txt",
                "stop_id,stop_code,stop_name,stop_desc,stop_lat,stop_lon,location_type,parent_station\n\
                 30001,,Howard (95th-bound),,42.019,-87.672,0,40900\n\
                 30002,,Jarvis (95th-bound),,42.016,-87.669,0,41190\n\
                 30003,,Kimball (Loop-bound),,41.967,-87.713,0,41290\n\
                 40003,,Kimball,,41.967,-87.713,1,\n\
                 1001,,Clark & Howard,,42.019,-87.673,0,\n",
            ),
            (
                "stop_times.txt",
                "trip_id,arrival_time,departure_time,stop_id,stop_sequence,stop_headsign,pickup_type,shape_dist_traveled\n\
                 R1,05:00:00,05:00:00,30001,1,,0,\n\
                 R1,05:03:00,05:03:00,30002,2,,0,\n\
                 B1,06:00:00,06:00:00,30003,1,,0,\n\
                 B1,06:04:00,06:04:00,40003,2,,0,\n\
                 BUS1,07:00:00,07:00:00,1001,1,,0,\n",
            ),
            (
                "trips.txt",
                "route_id,service_id,trip_id,direction_id,block_id,shape_id\n\
                 Red,W1,R1,1,,S1\n\
                 Brn,W1,B1,0,,S2\n\
                 22,W1,BUS1,0,,S3\n",
            ),
        ]
    }

    /// Zip archive of [`gtfs_files`].
    pub fn gtfs_zip() -> Vec<u8> {
        let files: Vec<(&str, Option<&[u8]>)> = gtfs_files()
            .into_iter()
            .map(|(name, data)| (name, Some(data.as_bytes())))
            .collect();
        zip_with(&files)
    }

    /// Build a zip archive. Entries with `None` data are directories.
    pub fn zip_with(entries: &[(&str, Option<&[u8]>)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for (name, data) in entries {
            match data {
                Some(data) => {
                    writer.start_file(*name, options).unwrap();
                    writer.write_all(data).unwrap();
                }
                None => writer.add_directory(*name, options).unwrap(),
            }
        }
        writer.finish().unwrap().into_inner()
    }

    /// Raw artifact for the version in [`GTFS_LAST_MODIFIED`].
    pub fn raw_artifact() -> RawArtifact {
        RawArtifact {
            version: Checkpoint::parse("2026-02-23T15:00:00").unwrap(),
            prefix: "gtfs_data/version=20260223T150000Z/".to_string(),
            files: gtfs_files()
                .into_iter()
                .map(|(name, _)| name.to_string())
                .collect(),
        }
    }

    /// One raw sample line with three trains across two routes.
    pub fn positions_sample_line() -> String {
        serde_json::json!({
            "timestamp": "2026-02-27T12:00:00+00:00",
            "data": [
                {
                    "ctatt": {
                        "tmst": "2026-02-27T06:00:00",
                        "errCd": "0",
                        "errNm": null,
                        "route": [{
                            "@name": "red",
                            "train": [
                                {
                                    "rn": "801", "destSt": "30173", "destNm": "Howard",
                                    "trDr": "1", "nextStaId": "40900", "nextStpId": "30173",
                                    "nextStaNm": "Howard", "prdt": "2026-02-27T05:59:30",
                                    "arrT": "2026-02-27T06:01:30", "isApp": "0", "isDly": "0",
                                    "lat": "42.0", "lon": "-87.6", "heading": "358"
                                },
                                {
                                    "rn": "802", "destSt": "30089", "destNm": "95th/Dan Ryan",
                                    "trDr": "5", "nextStaId": "41400", "nextStpId": "30269",
                                    "nextStaNm": "Roosevelt", "prdt": "2026-02-27T05:59:40",
                                    "arrT": "2026-02-27T06:00:40", "isApp": "1", "isDly": "0"
                                }
                            ]
                        }]
                    }
                },
                {
                    "ctatt": {
                        "tmst": "2026-02-27T06:00:01",
                        "errCd": "0",
                        "errNm": null,
                        "route": [{
                            "@name": "p",
                            "train": {
                                "rn": "508", "destSt": "30203", "destNm": "Linden",
                                "trDr": "1", "nextStaId": "40400", "nextStpId": "30079",
                                "nextStaNm": "Noyes", "prdt": "2026-02-27T05:59:50",
                                "arrT": "2026-02-27T06:02:50", "isApp": "0", "isDly": "1"
                            }
                        }]
                    }
                }
            ]
        })
        .to_string()
    }
}
