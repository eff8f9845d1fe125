//! Daily flattening of raw position samples into CSV.

use chrono::NaiveDate;
use flate2::read::GzDecoder;
use serde::Serialize;
use std::io::Read;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::metrics;
use crate::storage::ObjectStore;

use super::error::TrainLocationError;
use super::partition_prefix;
use super::records::{flatten_sample_line, TrainLocationRecord};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Result of processing one day's partition.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessSummary {
    pub date: NaiveDate,
    pub files_found: usize,
    pub files_processed: usize,
    pub records: usize,
    pub skipped_lines: usize,
    /// Written CSV, `None` when the partition yielded no records.
    pub output_key: Option<String>,
}

/// Records and skipped line count from one file.
struct FileRecords {
    records: Vec<TrainLocationRecord>,
    skipped_lines: usize,
}

/// Flattens one day of raw samples into a single CSV.
pub struct TrainLocationProcessor {
    store: Arc<dyn ObjectStore>,
    raw_prefix: String,
    derived_prefix: String,
}

impl TrainLocationProcessor {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        raw_prefix: impl Into<String>,
        derived_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            raw_prefix: raw_prefix.into(),
            derived_prefix: derived_prefix.into(),
        }
    }

    /// Key the CSV for `date` is written to.
    pub fn output_key(&self, date: NaiveDate) -> String {
        format!(
            "{}train_locations.csv",
            partition_prefix(&format!("{}train_locations/", self.derived_prefix), date)
        )
    }

    /// Process every sample file stored for `date`.
    ///
    /// Files that cannot be read or decompressed are skipped, as are blank
    /// and unparseable lines.
    pub async fn process_date(&self, date: NaiveDate) -> Result<ProcessSummary, TrainLocationError> {
        let prefix = partition_prefix(&self.raw_prefix, date);
        let objects = self.store.list(&prefix).await?;
        info!(prefix = %prefix, files = objects.len(), "Processing train location partition");

        let mut summary = ProcessSummary {
            date,
            files_found: objects.len(),
            files_processed: 0,
            records: 0,
            skipped_lines: 0,
            output_key: None,
        };
        let mut all_records = Vec::new();

        for (index, object) in objects.iter().enumerate() {
            let data = match self.store.get(&object.key).await {
                Ok(data) => data,
                Err(e) => {
                    error!(key = %object.key, error = %e, "Error downloading file");
                    continue;
                }
            };

            let file = match read_file(&data) {
                Ok(file) => file,
                Err(e) => {
                    error!(key = %object.key, error = %e, "Error processing file");
                    continue;
                }
            };

            info!(
                file = index + 1,
                records = file.records.len(),
                skipped = file.skipped_lines,
                "Processed file"
            );
            summary.files_processed += 1;
            summary.skipped_lines += file.skipped_lines;
            all_records.extend(file.records);
        }

        summary.records = all_records.len();
        if all_records.is_empty() {
            info!(date = %date, "No train location records to write");
            return Ok(summary);
        }

        let body = encode_records(&all_records)?;
        let key = self.output_key(date);
        self.store.put(&key, body).await?;
        metrics::TRAIN_LOCATION_RECORDS.inc_by(all_records.len() as u64);

        info!(
            key = %key,
            files_processed = summary.files_processed,
            files_found = summary.files_found,
            records = summary.records,
            skipped_lines = summary.skipped_lines,
            "Wrote train location records"
        );
        summary.output_key = Some(key);
        Ok(summary)
    }
}

fn decode_text(data: &[u8]) -> Result<String, std::io::Error> {
    if data.starts_with(&GZIP_MAGIC) {
        let mut text = String::new();
        GzDecoder::new(data).read_to_string(&mut text)?;
        Ok(text)
    } else {
        String::from_utf8(data.to_vec())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

fn read_file(data: &[u8]) -> Result<FileRecords, std::io::Error> {
    let text = decode_text(data)?;

    let mut records = Vec::new();
    let mut skipped_lines = 0;
    for (line_number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            skipped_lines += 1;
            continue;
        }
        match flatten_sample_line(line) {
            Ok(mut parsed) => records.append(&mut parsed),
            Err(e) => {
                warn!(line = line_number + 1, error = %e, "Error parsing line");
                skipped_lines += 1;
            }
        }
    }

    Ok(FileRecords {
        records,
        skipped_lines,
    })
}

fn encode_records(records: &[TrainLocationRecord]) -> Result<Vec<u8>, TrainLocationError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| TrainLocationError::Encode(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| TrainLocationError::Encode(e.to_string()))
}
