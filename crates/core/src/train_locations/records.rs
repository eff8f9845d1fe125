//! Raw position sample format and the flattened record written by processing.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One line of a raw sample file: every line's API response at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionsSample {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub data: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct TrackerResponse {
    #[serde(default)]
    ctatt: Ctatt,
}

#[derive(Debug, Default, Deserialize)]
struct Ctatt {
    #[serde(default, deserialize_with = "lenient_string")]
    tmst: Option<String>,
    #[serde(default, rename = "errCd", deserialize_with = "lenient_string")]
    err_cd: Option<String>,
    #[serde(default, rename = "errNm", deserialize_with = "lenient_string")]
    err_nm: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    route: Vec<RouteTrains>,
}

#[derive(Debug, Deserialize)]
struct RouteTrains {
    #[serde(default, rename = "@name", deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    train: Vec<TrainPosition>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrainPosition {
    #[serde(default, deserialize_with = "lenient_string")]
    rn: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    dest_st: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    dest_nm: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    tr_dr: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    next_sta_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    next_stp_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    next_sta_nm: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    prdt: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    arr_t: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    is_app: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    is_dly: Option<String>,
}

/// Scalars are usually strings but numbers and booleans are accepted as-is.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Single-element collections are sent as a bare object.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
    })
}

/// One train's position in one API sample.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrainLocationRecord {
    pub ingestion_timestamp: Option<String>,
    pub current_timestamp: Option<String>,
    pub error_code: Option<String>,
    pub error_number: Option<String>,
    pub route_name: Option<String>,
    pub run_number: Option<String>,
    pub destination_station_id: Option<String>,
    pub destination_station_name: Option<String>,
    pub train_direction: Option<String>,
    pub next_station_id: Option<String>,
    pub next_stop_id: Option<String>,
    pub next_station_name: Option<String>,
    pub prediction_timestamp: Option<String>,
    pub predicted_arrival: Option<String>,
    pub is_approaching: Option<String>,
    pub is_delayed: Option<String>,
}

/// Parse one raw sample line into flattened records.
pub fn flatten_sample_line(line: &str) -> Result<Vec<TrainLocationRecord>, serde_json::Error> {
    let sample: PositionsSample = serde_json::from_str(line)?;

    let mut records = Vec::new();
    for item in sample.data {
        let response: TrackerResponse = serde_json::from_value(item)?;
        let ctatt = response.ctatt;
        for route in ctatt.route {
            for train in route.train {
                records.push(TrainLocationRecord {
                    ingestion_timestamp: sample.timestamp.clone(),
                    current_timestamp: ctatt.tmst.clone(),
                    error_code: ctatt.err_cd.clone(),
                    error_number: ctatt.err_nm.clone(),
                    route_name: route.name.clone(),
                    run_number: train.rn,
                    destination_station_id: train.dest_st,
                    destination_station_name: train.dest_nm,
                    train_direction: train.tr_dr,
                    next_station_id: train.next_sta_id,
                    next_stop_id: train.next_stp_id,
                    next_station_name: train.next_sta_nm,
                    prediction_timestamp: train.prdt,
                    predicted_arrival: train.arr_t,
                    is_approaching: train.is_app,
                    is_delayed: train.is_dly,
                });
            }
        }
    }
    Ok(records)
}
