//! Pipeline orchestrator implementation.

use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{error, info, warn};

use crate::metrics;
use crate::notifier::{Notification, Notifier};
use crate::task::{FetchStatus, FetchTask, TransformTask};

use super::config::OrchestratorConfig;
use super::types::{
    OrchestratorError, OrchestratorStatus, RunOutcome, RunReport, RunState, StateKind, TaskStage,
};

/// Longest path: RunFetch → Decide → RunTransform → NotifyFailure.
const MAX_TRANSITIONS: usize = 3;

/// Result of executing one state.
enum Step {
    Next(RunState),
    Finished(RunOutcome),
}

/// Held by the spawned run task: owns the run lock and clears the running
/// flag when the run ends.
struct ActiveRun {
    orchestrator: Arc<PipelineOrchestrator>,
    _lock: OwnedMutexGuard<()>,
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        self.orchestrator.running.store(false, Ordering::Release);
    }
}

/// Sequences fetch → conditional transform, with failure notification.
pub struct PipelineOrchestrator {
    config: OrchestratorConfig,
    fetch: Arc<dyn FetchTask>,
    transform: Arc<dyn TransformTask>,
    notifier: Arc<dyn Notifier>,

    // Runtime state
    run_lock: Arc<Mutex<()>>,
    running: AtomicBool,
    runs_started: AtomicU64,
    runs_skipped: AtomicU64,
    last_run: RwLock<Option<RunReport>>,
}

impl PipelineOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        fetch: Arc<dyn FetchTask>,
        transform: Arc<dyn TransformTask>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            fetch,
            transform,
            notifier,
            run_lock: Arc::new(Mutex::new(())),
            running: AtomicBool::new(false),
            runs_started: AtomicU64::new(0),
            runs_skipped: AtomicU64::new(0),
            last_run: RwLock::new(None),
        }
    }

    /// Execute one run to its terminal state.
    ///
    /// Task failures do not make this return an error: they end the run in
    /// [`RunOutcome::Failed`] after one notification attempt. A trigger that
    /// arrives while another run is in progress is refused.
    ///
    /// The run executes on its own task. Dropping the returned future stops
    /// waiting for the report but the run still reaches its terminal state,
    /// releases the lock and records `last_run`.
    pub async fn trigger(self: &Arc<Self>) -> Result<RunReport, OrchestratorError> {
        let Ok(lock) = Arc::clone(&self.run_lock).try_lock_owned() else {
            self.runs_skipped.fetch_add(1, Ordering::Relaxed);
            metrics::PIPELINE_RUNS_SKIPPED.inc();
            warn!("Pipeline run already in progress, skipping trigger");
            return Err(OrchestratorError::AlreadyRunning);
        };
        self.running.store(true, Ordering::Release);
        self.runs_started.fetch_add(1, Ordering::Relaxed);

        let active = ActiveRun {
            orchestrator: Arc::clone(self),
            _lock: lock,
        };
        let handle = tokio::spawn(async move {
            let report = active.orchestrator.execute().await;
            drop(active);
            report
        });

        handle.await.map_err(|e| {
            error!(error = %e, "Pipeline run task aborted");
            OrchestratorError::Aborted(e.to_string())
        })
    }

    /// Drive the state machine from `RunFetch` to a terminal state.
    async fn execute(&self) -> RunReport {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        info!(run_id = %run_id, "Pipeline run started");

        let mut states: Vec<StateKind> = Vec::with_capacity(MAX_TRANSITIONS + 1);
        let mut state = RunState::RunFetch;
        let outcome = loop {
            states.push(state.kind());
            match self.step(&run_id, state).await {
                Step::Next(next) => {
                    debug_assert!(
                        states.len() <= MAX_TRANSITIONS,
                        "run exceeded {} transitions",
                        MAX_TRANSITIONS
                    );
                    state = next;
                }
                Step::Finished(outcome) => break outcome,
            }
        };

        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            states,
            outcome,
        };

        let label = report.outcome.label();
        metrics::PIPELINE_RUNS.with_label_values(&[label]).inc();
        metrics::PIPELINE_RUN_DURATION
            .with_label_values(&[label])
            .observe(report.duration_secs());

        if report.outcome.is_success() {
            info!(run_id = %report.run_id, outcome = label, "Pipeline run finished");
        } else {
            warn!(run_id = %report.run_id, outcome = label, "Pipeline run finished with failure");
        }

        *self.last_run.write().await = Some(report.clone());
        report
    }

    /// Execute `state` and return the transition it takes.
    async fn step(&self, run_id: &str, state: RunState) -> Step {
        match state {
            RunState::RunFetch => match self.fetch.fetch().await {
                Ok(status) => {
                    info!(run_id, task = self.fetch.name(), status = status.label(), "Fetch task completed");
                    Step::Next(RunState::Decide(status))
                }
                Err(e) => {
                    metrics::TASK_FAILURES
                        .with_label_values(&[self.fetch.name()])
                        .inc();
                    error!(run_id, task = self.fetch.name(), error = %e, "Fetch task failed");
                    Step::Next(RunState::NotifyFailure {
                        stage: TaskStage::Fetch,
                        error: e.to_string(),
                    })
                }
            },

            RunState::Decide(status) => match status {
                FetchStatus::Updated(raw) => Step::Next(RunState::RunTransform(raw)),
                FetchStatus::Unchanged => Step::Next(RunState::Done),
            },

            RunState::RunTransform(raw) => match self.transform.transform(&raw).await {
                Ok(derived) => {
                    info!(
                        run_id,
                        task = self.transform.name(),
                        key = %derived.key,
                        rows = derived.rows,
                        "Transform task completed"
                    );
                    Step::Finished(RunOutcome::Transformed { derived })
                }
                Err(e) => {
                    metrics::TASK_FAILURES
                        .with_label_values(&[self.transform.name()])
                        .inc();
                    error!(run_id, task = self.transform.name(), error = %e, "Transform task failed");
                    Step::Next(RunState::NotifyFailure {
                        stage: TaskStage::Transform,
                        error: e.to_string(),
                    })
                }
            },

            RunState::NotifyFailure { stage, error } => {
                let notified = self.notify_failure(run_id).await;
                Step::Finished(RunOutcome::Failed {
                    stage,
                    error,
                    notified,
                })
            }

            RunState::Done => {
                info!(run_id, "No new data, nothing to do");
                Step::Finished(RunOutcome::NoNewData)
            }
        }
    }

    /// Publish the fixed failure notification. Never fails the run.
    async fn notify_failure(&self, run_id: &str) -> bool {
        let notification = Notification::new(
            self.config.failure_subject.clone(),
            self.config.failure_message.clone(),
        );

        match self.notifier.publish(&notification).await {
            Ok(report) => {
                metrics::NOTIFICATIONS.with_label_values(&["delivered"]).inc();
                info!(
                    run_id,
                    notifier = self.notifier.name(),
                    delivered = report.delivered(),
                    failed = report.failed(),
                    "Failure notification published"
                );
                true
            }
            Err(e) => {
                metrics::NOTIFICATIONS.with_label_values(&["failed"]).inc();
                error!(run_id, notifier = self.notifier.name(), error = %e, "Failure notification could not be delivered");
                false
            }
        }
    }

    /// Get current orchestrator status.
    pub async fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            running: self.running.load(Ordering::Acquire),
            runs_started: self.runs_started.load(Ordering::Relaxed),
            runs_skipped: self.runs_skipped.load(Ordering::Relaxed),
            last_run: self.last_run.read().await.clone(),
        }
    }
}
