//! Types for the pipeline orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::task::{DerivedArtifact, FetchStatus, RawArtifact};

/// Errors that prevent a run from starting.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Another run is still in progress.
    #[error("a pipeline run is already in progress")]
    AlreadyRunning,

    /// The run task panicked or was cancelled before producing a report.
    #[error("pipeline run aborted: {0}")]
    Aborted(String),
}

/// Task a failed run stopped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStage {
    Fetch,
    Transform,
}

/// A state of one pipeline run, carrying the data the next step needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    RunFetch,
    Decide(FetchStatus),
    RunTransform(RawArtifact),
    NotifyFailure { stage: TaskStage, error: String },
    Done,
}

impl RunState {
    pub fn kind(&self) -> StateKind {
        match self {
            RunState::RunFetch => StateKind::RunFetch,
            RunState::Decide(_) => StateKind::Decide,
            RunState::RunTransform(_) => StateKind::RunTransform,
            RunState::NotifyFailure { .. } => StateKind::NotifyFailure,
            RunState::Done => StateKind::Done,
        }
    }
}

/// Data-free name of a [`RunState`], recorded in run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    RunFetch,
    Decide,
    RunTransform,
    NotifyFailure,
    Done,
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// New data was fetched and the derived artifact written.
    Transformed { derived: DerivedArtifact },
    /// Upstream was unchanged; nothing to do.
    NoNewData,
    /// A task failed and a notification was attempted.
    Failed {
        stage: TaskStage,
        error: String,
        /// Whether the notifier accepted the notification.
        notified: bool,
    },
}

impl RunOutcome {
    /// Outcome label used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Transformed { .. } => "transformed",
            RunOutcome::NoNewData => "no_new_data",
            RunOutcome::Failed { .. } => "failed",
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, RunOutcome::Failed { .. })
    }
}

/// Record of one completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// States in the order they were entered.
    pub states: Vec<StateKind>,
    #[serde(flatten)]
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn duration_secs(&self) -> f64 {
        (self.finished_at - self.started_at)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Whether a run is in progress.
    pub running: bool,
    /// Runs started since process start.
    pub runs_started: u64,
    /// Triggers rejected because a run was in progress.
    pub runs_skipped: u64,
    /// Most recent completed run.
    pub last_run: Option<RunReport>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::Checkpoint;

    #[test]
    fn test_run_report_serialization() {
        let started_at = Utc::now();
        let report = RunReport {
            run_id: "run-1".to_string(),
            started_at,
            finished_at: started_at,
            states: vec![StateKind::RunFetch, StateKind::NotifyFailure],
            outcome: RunOutcome::Failed {
                stage: TaskStage::Fetch,
                error: "Missing required configuration: gtfs.feed_url".to_string(),
                notified: true,
            },
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["stage"], "fetch");
        assert_eq!(json["states"], serde_json::json!(["run_fetch", "notify_failure"]));

        let parsed: RunReport = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_outcome_labels() {
        let derived = DerivedArtifact {
            key: "derived/gtfs_expected_cta_schedule.csv".to_string(),
            rows: 3,
            source_version: Checkpoint::parse("2026-02-23T15:00:00").unwrap(),
        };
        assert_eq!(RunOutcome::Transformed { derived }.label(), "transformed");
        assert_eq!(RunOutcome::NoNewData.label(), "no_new_data");
        assert!(RunOutcome::NoNewData.is_success());
    }

    #[test]
    fn test_state_kind() {
        assert_eq!(RunState::Decide(FetchStatus::Unchanged).kind(), StateKind::Decide);
        assert_eq!(
            RunState::NotifyFailure {
                stage: TaskStage::Transform,
                error: "boom".into(),
            }
            .kind(),
            StateKind::NotifyFailure
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            OrchestratorError::AlreadyRunning.to_string(),
            "a pipeline run is already in progress"
        );
        assert_eq!(
            OrchestratorError::Aborted("task panicked".into()).to_string(),
            "pipeline run aborted: task panicked"
        );
    }
}
