//! Types exchanged between tasks and the orchestrator.

use serde::{Deserialize, Serialize};

use crate::checkpoint::Checkpoint;

/// Unmodified upstream payload persisted by a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawArtifact {
    /// Upstream version (its `Last-Modified` time).
    pub version: Checkpoint,
    /// Key prefix all files were written under, ending with `/`.
    pub prefix: String,
    /// File names relative to `prefix`.
    pub files: Vec<String>,
}

impl RawArtifact {
    /// Full object key of one of the artifact's files.
    pub fn key(&self, file: &str) -> String {
        format!("{}{}", self.prefix, file)
    }
}

/// Output of a transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedArtifact {
    /// Object key of the derived output.
    pub key: String,
    /// Number of data rows written.
    pub rows: usize,
    /// Raw artifact version the output was derived from.
    pub source_version: Checkpoint,
}

/// Result of a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchStatus {
    /// New upstream data was persisted.
    Updated(RawArtifact),
    /// Upstream has not changed since the last checkpoint.
    Unchanged,
}

impl FetchStatus {
    /// Status label (`updated` / `unchanged`).
    pub fn label(&self) -> &'static str {
        match self {
            FetchStatus::Updated(_) => "updated",
            FetchStatus::Unchanged => "unchanged",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> RawArtifact {
        RawArtifact {
            version: Checkpoint::parse("2026-02-23T15:00:00").unwrap(),
            prefix: "gtfs_data/version=20260223T150000Z/".to_string(),
            files: vec!["stops.txt".to_string()],
        }
    }

    #[test]
    fn test_raw_artifact_key() {
        assert_eq!(
            artifact().key("stops.txt"),
            "gtfs_data/version=20260223T150000Z/stops.txt"
        );
    }

    #[test]
    fn test_fetch_status_serialization() {
        let json = serde_json::to_value(FetchStatus::Unchanged).unwrap();
        assert_eq!(json["status"], "unchanged");

        let json = serde_json::to_value(FetchStatus::Updated(artifact())).unwrap();
        assert_eq!(json["status"], "updated");
        assert_eq!(json["version"], "2026-02-23T15:00:00");
        assert_eq!(json["files"][0], "stops.txt");
    }

    #[test]
    fn test_fetch_status_label() {
        assert_eq!(FetchStatus::Unchanged.label(), "unchanged");
        assert_eq!(FetchStatus::Updated(artifact()).label(), "updated");
    }
}
